//! Error taxonomy for the subgraph execution plane.
//!
//! One variant per origin named in the runtime's error handling design, so
//! callers can match on failure kind instead of parsing messages.

use tower::BoxError;

/// Errors the runtime itself can raise while routing a subgraph request.
///
/// Transport-specific failures (timeouts, connection resets, ...) are not
/// modeled here: they arrive as an opaque [`RuntimeError::TransportExecution`]
/// wrapping whatever the transport produced.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The transport kind for a subgraph could not be resolved to a factory,
    /// or the resolved factory was misshaped.
    #[error(
        "no transport registered for kind {kind:?}; expected an inline transport, an inline \
         registry entry, or a discoverable crate named like {conventional_name:?}"
    )]
    Configuration {
        kind: String,
        conventional_name: String,
    },

    /// The host's transport entry map has no entry for this subgraph.
    #[error("no transport entry configured for subgraph {subgraph_name:?}")]
    MissingTransportEntry { subgraph_name: String },

    /// Transport resolution and executor construction together took longer
    /// than [`crate::config::RuntimeConfig::executor_construction_timeout`].
    #[error(
        "constructing the executor for subgraph {subgraph_name:?} exceeded the \
         {timeout:?} construction timeout"
    )]
    ExecutorConstructionTimeout {
        subgraph_name: String,
        timeout: std::time::Duration,
    },

    /// A transport module was found by dynamic discovery but did not expose
    /// a usable `Transport` implementation.
    #[error("transport {kind:?} was resolved but does not implement the Transport contract")]
    TransportMisshaped { kind: String },

    /// The upstream transport call itself failed.
    #[error("subgraph {subgraph_name:?} execution failed: {source}")]
    TransportExecution {
        subgraph_name: String,
        #[source]
        source: BoxError,
    },

    /// A subscription stream produced by a subgraph executor errored mid-flight.
    #[error("subgraph {subgraph_name:?} subscription stream terminated: {source}")]
    StreamTermination {
        subgraph_name: String,
        #[source]
        source: BoxError,
    },

    /// A pre-hook or post-hook returned an error.
    #[error("hook failed for subgraph {subgraph_name:?}: {source}")]
    Hook {
        subgraph_name: String,
        #[source]
        source: BoxError,
    },
}

impl RuntimeError {
    pub fn subgraph_name(&self) -> Option<&str> {
        match self {
            RuntimeError::Configuration { .. } | RuntimeError::TransportMisshaped { .. } => None,
            RuntimeError::MissingTransportEntry { subgraph_name }
            | RuntimeError::ExecutorConstructionTimeout { subgraph_name, .. }
            | RuntimeError::TransportExecution { subgraph_name, .. }
            | RuntimeError::StreamTermination { subgraph_name, .. }
            | RuntimeError::Hook { subgraph_name, .. } => Some(subgraph_name),
        }
    }
}
