//! Federation detection: does a subgraph's schema need the federation →
//! stitching rewrite at all?

use apollo_compiler::Schema;
use apollo_compiler::schema::ExtendedType;

use crate::directives::federation::SERVICE_FIELD;

/// A subgraph is federated if its query root type exposes the conventional
/// `_service` field. Schemas with no query type, or a query type missing
/// the field, are treated as already-stitchable subgraphs.
pub fn is_federated(schema: &Schema) -> bool {
    let Some(query_type_name) = schema.schema_definition.query.as_ref() else {
        return false;
    };
    match schema.types.get(query_type_name.as_ref()) {
        Some(ExtendedType::Object(query_type)) => query_type.fields.contains_key(SERVICE_FIELD),
        _ => false,
    }
}
