//! Local field resolvers that must survive a subgraph's federation→stitching
//! rewrite.
//!
//! A subgraph schema can carry resolvers the host attached directly to a
//! field (a computed field, a local shortcut that never leaves the process).
//! Rewriting the schema from translated SDL produces a brand new
//! [`apollo_compiler::Schema`] value with no knowledge of those resolvers, so
//! the merger re-attaches them by `(type, field)` identity after the rebuild.
//! A resolver whose field didn't survive the rewrite is dropped with a
//! warning, never a hard failure — see §4.4 "Failure semantics".

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use apollo_compiler::Schema;
use apollo_compiler::schema::ExtendedType;
use tracing::warn;

/// Identifies one field a resolver is attached to.
pub type ResolverKey = (String, String);

/// A host-attached resolver, opaque to this crate.
///
/// This crate only needs to carry the resolver's identity through a schema
/// rewrite, never to invoke it — invocation is the unified schema executor's
/// job (out of scope, see Non-goals) — so the payload is type-erased.
pub type OpaqueResolver = Arc<dyn Any + Send + Sync>;

/// The set of local field resolvers attached to one subgraph's schema.
#[derive(Clone, Default)]
pub struct ResolverMap {
    entries: Arc<HashMap<ResolverKey, OpaqueResolver>>,
}

impl ResolverMap {
    pub fn new(entries: HashMap<ResolverKey, OpaqueResolver>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&OpaqueResolver> {
        self.entries
            .get(&(type_name.to_string(), field_name.to_string()))
    }

    /// Re-attaches this resolver set onto `rewritten_schema`, dropping any
    /// resolver whose `(type, field)` no longer exists. Never fails: a
    /// resolver mismatch is recorded as a warning, not an error (§4.4).
    pub fn reattach(&self, subgraph_name: &str, rewritten_schema: &Schema) -> ResolverMap {
        let mut kept = HashMap::with_capacity(self.entries.len());
        for (key, resolver) in self.entries.iter() {
            if field_exists(rewritten_schema, &key.0, &key.1) {
                kept.insert(key.clone(), resolver.clone());
            } else {
                warn!(
                    subgraph.name = subgraph_name,
                    r#type = key.0.as_str(),
                    field = key.1.as_str(),
                    "dropping resolver for a field that did not survive the federation rewrite"
                );
            }
        }
        ResolverMap::new(kept)
    }
}

fn field_exists(schema: &Schema, type_name: &str, field_name: &str) -> bool {
    match schema.types.get(type_name) {
        Some(ExtendedType::Object(object_type)) => object_type.fields.contains_key(field_name),
        Some(ExtendedType::Interface(interface_type)) => {
            interface_type.fields.contains_key(field_name)
        }
        _ => false,
    }
}
