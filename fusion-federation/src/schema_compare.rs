//! Canonical-printed-form comparison for schemas and documents.
//!
//! The translation cache in [`crate::translate`] already keys on raw SDL
//! text, which is cheap but sensitive to incidental whitespace/ordering
//! differences between two fetches of a subgraph that didn't actually
//! change. This module gives callers that care about *semantic* stability
//! (e.g. deciding whether a hot-reloaded subgraph schema actually changed) a
//! comparison based on the printer's canonical form instead of raw text.

use apollo_compiler::Schema;
use apollo_compiler::ast::Document;

/// True iff `a` and `b` print to byte-identical SDL, directives included.
///
/// Two schemas that differ only in whitespace or the textual order of their
/// definitions compare equal here, since `apollo_compiler`'s printer is
/// deterministic for a given parsed representation.
pub fn compare_schemas(a: &Schema, b: &Schema) -> bool {
    a.to_string() == b.to_string()
}

/// True iff `a` and `b` print to byte-identical GraphQL, directives included.
pub fn compare_documents(a: &Document, b: &Document) -> bool {
    a.to_string() == b.to_string()
}
