//! Error taxonomy for federation detection, SDL fetch, and schema merging.

use tower::BoxError;

/// A single subgraph's contribution to a failed merge.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The subgraph rejected, or never answered, the `_service { sdl }` query.
    #[error("subgraph {subgraph_name:?} rejected the service definition query: {source}")]
    SdlFetch {
        subgraph_name: String,
        #[source]
        source: BoxError,
    },

    /// A compatible-looking response had no usable `_service.sdl` string.
    #[error("subgraph {subgraph_name:?} returned a malformed _service response")]
    MalformedServiceResponse { subgraph_name: String },

    /// The translated SDL failed to parse as a GraphQL schema.
    #[error("subgraph {subgraph_name:?} produced an unparsable schema after translation: {source}")]
    Unparsable {
        subgraph_name: String,
        #[source]
        source: BoxError,
    },

    /// Stitching the rewritten subschemas together failed.
    #[error("stitching failed: {source}")]
    Stitch {
        #[source]
        source: BoxError,
    },
}

/// All per-subgraph failures collected during one merge attempt.
///
/// Modeled as a flat `Vec` rather than a tree: a merge either aggregates
/// every independent subgraph failure it can find (SDL fetches run
/// concurrently) or stops at the first stitch-time failure, which by
/// definition cannot be parallelized against the others.
#[derive(Debug, thiserror::Error)]
#[error("failed to merge {} subgraph(s): {}", .0.len(), summarize(.0))]
pub struct AggregateMergeError(pub Vec<MergeError>);

fn summarize(errors: &[MergeError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
