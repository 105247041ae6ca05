//! Minimal `@link` inspection: just enough to tell whether a schema already
//! imports the federation spec, per the merger's first detection step.
//!
//! The teacher's own `apollo-at-link` crate implements the full `@link`
//! bootstrap (imports, purposes, renames); this crate only needs the one
//! fact the merger's detection step cares about, so it reimplements that
//! slice directly against `apollo_compiler::Schema` rather than pulling in
//! the whole spec-resolution machinery.

use apollo_compiler::Schema;
use apollo_compiler::ast::Value;

pub const LINK_DIRECTIVE_NAME: &str = "link";
pub const FEDERATION_SPEC_URL_PREFIX: &str = "https://specs.apollo.dev/federation/";

/// Whether `schema` carries an `@link` import of the federation spec on its
/// schema definition, the way a subgraph that was already composed once
/// (and has its federation metadata inlined) would.
pub fn links_federation_spec(schema: &Schema) -> bool {
    schema
        .schema_definition
        .directives
        .iter()
        .filter(|directive| directive.name == LINK_DIRECTIVE_NAME)
        .any(|directive| {
            directive
                .argument_by_name("url")
                .map(|value| matches!(value.as_ref(), Value::String(url) if url.starts_with(FEDERATION_SPEC_URL_PREFIX)))
                .unwrap_or(false)
        })
}
