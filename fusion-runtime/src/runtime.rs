//! [`FusionRuntime`]: the assembled subgraph execution plane — transport
//! registry, lazy executor cache, hook pipeline, and disposable stack,
//! wired together behind one entry point.

use std::collections::HashMap;
use std::sync::Arc;

use tower::BoxError;

use crate::cache::ExecutorCache;
use crate::config::RuntimeConfig;
use crate::context::TransportContext;
use crate::disposable::DisposableStack;
use crate::executor::SubgraphSchema;
use crate::executor::TransportEntry;
use crate::hooks::OnSubgraphExecuteHook;
use crate::request::ExecutionRequest;
use crate::request::ExecutionResult;
use crate::subgraph_name::SubgraphName;
use crate::transport::TransportRegistry;
use crate::transport::TransportSource;

/// The subgraph execution plane for one running supergraph.
///
/// Built once per process (or per hot-reload generation); cheap to clone
/// only in the sense that its pieces are already behind `Arc`s — cloning a
/// `FusionRuntime` itself is not supported, since its executor cache and
/// disposable stack are meant to be shared by reference.
pub struct FusionRuntime {
    cache: ExecutorCache,
    disposables: Arc<DisposableStack>,
    config: RuntimeConfig,
}

#[buildstructor::buildstructor]
impl FusionRuntime {
    /// Builds a runtime from the host's static wiring.
    ///
    /// `subgraph_getter` and `transport_entry_getter` are late-bound: they
    /// are called fresh on every cache miss, so a hot-reloaded supergraph is
    /// visible to any subgraph whose executor hasn't been constructed yet
    /// (already-constructed executors are unaffected — see Non-goals).
    #[builder(visibility = "pub")]
    fn new(
        transports: Option<TransportSource>,
        hooks: Vec<Arc<dyn OnSubgraphExecuteHook>>,
        subgraph_getter: Arc<dyn Fn(&SubgraphName) -> SubgraphSchema + Send + Sync>,
        transport_entry_getter: Arc<dyn Fn(&SubgraphName) -> Option<TransportEntry> + Send + Sync>,
        transport_context: Option<HashMap<String, serde_json::Value>>,
        config: Option<RuntimeConfig>,
    ) -> Self {
        let disposables = Arc::new(DisposableStack::new());
        let config = config.unwrap_or_default();
        let cache = ExecutorCache::new(
            TransportRegistry::new(transports),
            Arc::new(hooks),
            disposables.clone(),
            subgraph_getter,
            transport_entry_getter,
            TransportContext::new(transport_context.unwrap_or_default()),
            config.clone(),
        );
        Self {
            cache,
            disposables,
            config,
        }
    }

    /// A fake runtime for tests: no transports or hooks, a subgraph getter
    /// that always returns an empty `type Query { _: Boolean }` schema, and
    /// a transport entry getter that returns `None` (so execution fails
    /// fast with `RuntimeError::MissingTransportEntry` unless the caller
    /// overrides it). Not exposed outside `#[cfg(test)]` builds.
    #[cfg(test)]
    #[builder(visibility = "pub(crate)")]
    fn fake_new(
        transports: Option<TransportSource>,
        hooks: Option<Vec<Arc<dyn OnSubgraphExecuteHook>>>,
        transport_entry_getter: Option<
            Arc<dyn Fn(&SubgraphName) -> Option<TransportEntry> + Send + Sync>,
        >,
    ) -> Self {
        FusionRuntime::builder()
            .and_transports(transports)
            .hooks(hooks.unwrap_or_default())
            .subgraph_getter(Arc::new(|_name: &SubgraphName| {
                SubgraphSchema(Arc::from("type Query { _: Boolean }"))
            }))
            .transport_entry_getter(
                transport_entry_getter
                    .unwrap_or_else(|| Arc::new(|_name: &SubgraphName| None)),
            )
            .build()
    }
}

impl FusionRuntime {
    /// Routes one GraphQL operation to the named subgraph's executor,
    /// building that executor first if this is the first call for it.
    pub async fn on_subgraph_execute(
        &self,
        subgraph_name: impl Into<SubgraphName>,
        request: ExecutionRequest,
    ) -> Result<ExecutionResult, BoxError> {
        self.cache.on_subgraph_execute(subgraph_name, request).await
    }

    /// Disposes every constructed executor's resources, in reverse
    /// construction order. Callers must stop routing new requests to this
    /// runtime before calling this — disposing while requests are in
    /// flight is not safe (see `DisposableStack`).
    pub async fn shutdown(&self) -> Result<(), BoxError> {
        self.disposables.dispose_all().await
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}
