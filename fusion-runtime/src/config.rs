//! Deployment-time configuration for a [`crate::runtime::FusionRuntime`].
//!
//! Host applications typically deserialize this from their own YAML/JSON
//! configuration tree; the runtime itself never reads a config file from
//! disk (see Non-goals).

use serde::Deserialize;
use serde::Serialize;

/// Tunables that affect how the subgraph execution plane behaves, as
/// opposed to the per-subgraph wiring (transports, hooks) supplied
/// programmatically through [`crate::runtime::FusionRuntimeBuilder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RuntimeConfig {
    /// Maximum time to wait for a single subgraph's executor to be
    /// constructed, including transport resolution. Does not bound the
    /// lifetime of requests served by an already-constructed executor.
    #[serde(with = "humantime_serde")]
    pub executor_construction_timeout: std::time::Duration,

    /// Whether to emit an `info`-level span per subgraph request. Disabling
    /// this does not affect `warn`/`error` logs on the disposal and
    /// transport-resolution paths, which always fire.
    pub request_tracing: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            executor_construction_timeout: std::time::Duration::from_secs(10),
            request_tracing: true,
        }
    }
}
