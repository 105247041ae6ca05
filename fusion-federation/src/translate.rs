//! Rewrites a federated subgraph's SDL into a stitchable schema: federation
//! directives come off, their stitching equivalents go on.
//!
//! Translation is cached keyed by the *content* of the input SDL (not the
//! subgraph name), so a supergraph reload that re-resolves an unchanged
//! subgraph does not pay to retranslate it.

use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use apollo_compiler::Node;
use apollo_compiler::Schema;
use apollo_compiler::ast::Value;
use apollo_compiler::schema::Directive;
use apollo_compiler::schema::ExtendedType;
use dashmap::DashMap;

use crate::directives::federation;
use crate::directives::stitching;
use crate::error::MergeError;

/// Caches federation→stitching translations keyed by a hash of the input
/// SDL text.
#[derive(Default)]
pub struct TranslationCache {
    entries: DashMap<u64, Arc<str>>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates `sdl`, reusing a cached result if this exact SDL text was
    /// translated before.
    pub fn translate(&self, subgraph_name: &str, sdl: &str) -> Result<Arc<str>, MergeError> {
        let key = content_hash(sdl);
        if let Some(cached) = self.entries.get(&key) {
            return Ok(cached.clone());
        }
        let translated = Arc::from(translate_to_stitching(subgraph_name, sdl)?);
        self.entries.insert(key, Arc::clone(&translated));
        Ok(translated)
    }

    /// Number of distinct SDL texts translated so far. Mainly useful for
    /// tests asserting that a repeated merge hits the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn content_hash(sdl: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    sdl.hash(&mut hasher);
    hasher.finish()
}

/// Parses `sdl`, strips recognized federation directives from every type,
/// and re-prints it with their stitching equivalents attached.
///
/// Only the directives this crate's merger cares about are translated:
/// `@key` becomes a type-level `@merge`, `@requires` becomes a field-level
/// `@computed`. `@external`/`@provides`/`@override`/`@shareable`/`@tag`/
/// `@inaccessible` are dropped — the stitched schema trusts the upstream
/// and has no equivalent concept for them (see DESIGN.md).
pub fn translate_to_stitching(subgraph_name: &str, sdl: &str) -> Result<String, MergeError> {
    let mut schema = Schema::parse(sdl, "subgraph.graphql").map_err(|err| MergeError::Unparsable {
        subgraph_name: subgraph_name.to_string(),
        source: err.to_string().into(),
    })?;

    let type_names: Vec<_> = schema.types.keys().cloned().collect();
    for type_name in type_names {
        let Some(ExtendedType::Object(object_type)) = schema.types.get_mut(&type_name) else {
            continue;
        };
        let object_type = object_type.make_mut();

        let key_fields: Vec<String> = object_type
            .directives
            .iter()
            .filter(|d| d.name == federation::KEY)
            .filter_map(|d| string_argument(d, "fields"))
            .collect();

        object_type.directives.retain(|d| {
            !matches!(
                d.name.as_str(),
                federation::KEY
                    | federation::EXTENDS
                    | federation::EXTERNAL
                    | federation::INACCESSIBLE
                    | federation::OVERRIDE
                    | federation::PROVIDES
                    | federation::SHAREABLE
                    | federation::TAG
            )
        });

        for key_field in &key_fields {
            object_type
                .directives
                .push(Node::new(merge_directive(key_field)));
        }

        for (_, field) in object_type.fields.iter_mut() {
            let field = field.make_mut();
            let requires = field
                .directives
                .iter()
                .find(|d| d.name == federation::REQUIRES)
                .and_then(|d| string_argument(d, "fields"));
            field
                .directives
                .retain(|d| !matches!(d.name.as_str(), federation::REQUIRES | federation::EXTERNAL));
            if let Some(selection_set) = requires {
                field
                    .directives
                    .push(Node::new(computed_directive(&selection_set)));
            }
        }
    }

    Ok(schema.to_string())
}

fn string_argument(directive: &Directive, name: &str) -> Option<String> {
    directive.argument_by_name(name).and_then(|value| match value.as_ref() {
        Value::String(s) => Some(s.clone()),
        _ => None,
    })
}

fn merge_directive(key_field: &str) -> Directive {
    Directive {
        name: stitching::MERGE.into(),
        arguments: vec![
            apollo_compiler::ast::Argument {
                name: "keyField".into(),
                value: Value::String(key_field.to_string()).into(),
            }
            .into(),
        ],
    }
}

fn computed_directive(selection_set: &str) -> Directive {
    Directive {
        name: stitching::COMPUTED.into(),
        arguments: vec![
            apollo_compiler::ast::Argument {
                name: "selectionSet".into(),
                value: Value::String(selection_set.to_string()).into(),
            }
            .into(),
        ],
    }
}
