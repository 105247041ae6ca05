//! The lazy subgraph executor cache: one [`Executor`] per subgraph, built
//! at most once, no matter how many requests race to be first.
//!
//! The reference system gets this "first caller wins" property by inserting
//! a placeholder promise into its cache before doing any async work, which
//! only works because its event loop is single-threaded. On a
//! multi-threaded runtime that placeholder-then-replace dance is a data
//! race, so each entry is a [`tokio::sync::OnceCell`] instead: every caller
//! for the same subgraph awaits the same cell, and exactly one of them runs
//! the initializer (see DESIGN.md).

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tower::BoxError;
use tracing::debug;

use crate::config::RuntimeConfig;
use crate::context::TransportContext;
use crate::disposable::DisposableStack;
use crate::error::RuntimeError;
use crate::executor::Executor;
use crate::executor::SubgraphExecCtx;
use crate::executor::SubgraphSchema;
use crate::executor::TransportEntry;
use crate::hooks::OnSubgraphExecuteHook;
use crate::hooks::wrap_executor_with_hooks;
use crate::request::ExecutionRequest;
use crate::request::ExecutionResult;
use crate::subgraph_name::SubgraphName;
use crate::transport::TransportRegistry;

type SubgraphGetter = Arc<dyn Fn(&SubgraphName) -> SubgraphSchema + Send + Sync>;
type TransportEntryGetter = Arc<dyn Fn(&SubgraphName) -> Option<TransportEntry> + Send + Sync>;

/// Builds and caches one hook-wrapped [`Executor`] per subgraph.
///
/// A cache miss triggers transport resolution, executor construction,
/// disposer registration, and hook wrapping exactly once per subgraph name;
/// every other concurrent or subsequent caller for that name awaits the
/// same in-flight initialization and then reuses the result. A failed
/// initialization is not remembered — the next call retries from scratch.
pub struct ExecutorCache {
    entries: DashMap<SubgraphName, Arc<OnceCell<Arc<dyn Executor>>>>,
    registry: TransportRegistry,
    hooks: Arc<Vec<Arc<dyn OnSubgraphExecuteHook>>>,
    disposables: Arc<DisposableStack>,
    subgraph_getter: SubgraphGetter,
    transport_entry_getter: TransportEntryGetter,
    transport_context: TransportContext,
    config: RuntimeConfig,
}

impl ExecutorCache {
    pub fn new(
        registry: TransportRegistry,
        hooks: Arc<Vec<Arc<dyn OnSubgraphExecuteHook>>>,
        disposables: Arc<DisposableStack>,
        subgraph_getter: SubgraphGetter,
        transport_entry_getter: TransportEntryGetter,
        transport_context: TransportContext,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            entries: DashMap::new(),
            registry,
            hooks,
            disposables,
            subgraph_getter,
            transport_entry_getter,
            transport_context,
            config,
        }
    }

    /// Executes `request` against `subgraph_name`'s executor, building it
    /// first if this is the first call for that subgraph.
    pub async fn on_subgraph_execute(
        &self,
        subgraph_name: impl Into<SubgraphName>,
        request: ExecutionRequest,
    ) -> Result<ExecutionResult, BoxError> {
        let subgraph_name = subgraph_name.into();
        let executor = self.executor_for(subgraph_name).await?;
        executor.execute(request).await
    }

    async fn executor_for(
        &self,
        subgraph_name: SubgraphName,
    ) -> Result<Arc<dyn Executor>, BoxError> {
        // `.clone()` the `Arc<OnceCell<_>>` out and let the `DashMap` shard
        // guard drop here, so the shard lock isn't held across the
        // initializer's `.await` below.
        let cell = self
            .entries
            .entry(subgraph_name.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let executor = cell
            .get_or_try_init(|| self.initialize(subgraph_name.clone()))
            .await?;
        Ok(executor.clone())
    }

    async fn initialize(&self, subgraph_name: SubgraphName) -> Result<Arc<dyn Executor>, BoxError> {
        debug!(subgraph.name = %subgraph_name, "constructing subgraph executor");

        let timeout = self.config.executor_construction_timeout;
        match tokio::time::timeout(timeout, self.build_executor(subgraph_name.clone())).await {
            Ok(result) => result,
            Err(_elapsed) => Err(Box::new(RuntimeError::ExecutorConstructionTimeout {
                subgraph_name: subgraph_name.to_string(),
                timeout,
            }) as BoxError),
        }
    }

    async fn build_executor(&self, subgraph_name: SubgraphName) -> Result<Arc<dyn Executor>, BoxError> {
        let ctx = self.build_ctx(subgraph_name.clone());
        let transport_entry = ctx.transport_entry().ok_or_else(|| {
            Box::new(RuntimeError::MissingTransportEntry {
                subgraph_name: subgraph_name.to_string(),
            }) as BoxError
        })?;

        let transport = self.registry.get_factory(&transport_entry.kind).await?;
        let executor = transport.get_subgraph_executor(ctx.clone()).await?;

        if let Some(disposer) = executor.disposer() {
            self.disposables.push(disposer).await;
        }

        Ok(wrap_executor_with_hooks(
            executor,
            self.hooks.clone(),
            ctx,
            self.config.request_tracing,
        ))
    }

    fn build_ctx(&self, subgraph_name: SubgraphName) -> SubgraphExecCtx {
        let subgraph_getter = self.subgraph_getter.clone();
        let transport_entry_getter = self.transport_entry_getter.clone();
        let name_for_subgraph = subgraph_name.clone();
        let name_for_transport = subgraph_name.clone();
        SubgraphExecCtx::new(
            subgraph_name,
            Arc::new(move || subgraph_getter(&name_for_subgraph)),
            Arc::new(move || transport_entry_getter(&name_for_transport)),
            self.transport_context.clone(),
        )
    }

    #[cfg(test)]
    pub fn cached_len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ExecutionSingleResult;
    use crate::transport::TransportSource;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    struct CountingTransport {
        builds: Arc<AtomicUsize>,
    }

    struct CountingExecutor;

    #[async_trait]
    impl Executor for CountingExecutor {
        async fn execute(&self, _request: ExecutionRequest) -> Result<ExecutionResult, BoxError> {
            Ok(ExecutionResult::single(ExecutionSingleResult::from_data(
                serde_json_bytes::json!({ "ok": true }),
            )))
        }
    }

    #[async_trait]
    impl crate::executor::Transport for CountingTransport {
        async fn get_subgraph_executor(
            &self,
            _ctx: SubgraphExecCtx,
        ) -> Result<Arc<dyn Executor>, BoxError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            // Simulate non-trivial async construction (e.g. a connection
            // handshake), to give concurrent callers a chance to race.
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(Arc::new(CountingExecutor))
        }
    }

    fn cache_with(transport: CountingTransport) -> ExecutorCache {
        let mut map: HashMap<String, Arc<dyn crate::executor::Transport>> = HashMap::new();
        map.insert("http".to_string(), Arc::new(transport));
        let registry = TransportRegistry::new(Some(TransportSource::Map(Arc::new(map))));
        ExecutorCache::new(
            registry,
            Arc::new(Vec::new()),
            Arc::new(DisposableStack::new()),
            Arc::new(|_name| SubgraphSchema(Arc::from("type Query { x: Int }"))),
            Arc::new(|_name| {
                Some(TransportEntry {
                    kind: "http".to_string(),
                    options: serde_json::Value::Null,
                })
            }),
            TransportContext::default(),
            RuntimeConfig::default(),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_calls_build_the_executor_exactly_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(cache_with(CountingTransport {
            builds: builds.clone(),
        }));

        let barrier = Arc::new(tokio::sync::Barrier::new(8));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                cache
                    .on_subgraph_execute("products", ExecutionRequest::new("{ x }"))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(cache.cached_len(), 1);
    }

    #[tokio::test]
    async fn distinct_subgraph_names_get_distinct_entries() {
        let builds = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(CountingTransport {
            builds: builds.clone(),
        });
        cache
            .on_subgraph_execute("products", ExecutionRequest::new("{ x }"))
            .await
            .unwrap();
        cache
            .on_subgraph_execute("PRODUCTS", ExecutionRequest::new("{ x }"))
            .await
            .unwrap();
        cache
            .on_subgraph_execute("reviews", ExecutionRequest::new("{ x }"))
            .await
            .unwrap();

        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert_eq!(cache.cached_len(), 2);
    }

    struct AlwaysFailsTransport;

    #[async_trait]
    impl crate::executor::Transport for AlwaysFailsTransport {
        async fn get_subgraph_executor(
            &self,
            _ctx: SubgraphExecCtx,
        ) -> Result<Arc<dyn Executor>, BoxError> {
            Err("connection refused".into())
        }
    }

    #[tokio::test]
    async fn a_failed_initialization_is_not_cached() {
        let mut map: HashMap<String, Arc<dyn crate::executor::Transport>> = HashMap::new();
        map.insert("http".to_string(), Arc::new(AlwaysFailsTransport));
        let registry = TransportRegistry::new(Some(TransportSource::Map(Arc::new(map))));
        let cache = ExecutorCache::new(
            registry,
            Arc::new(Vec::new()),
            Arc::new(DisposableStack::new()),
            Arc::new(|_name| SubgraphSchema(Arc::from("type Query { x: Int }"))),
            Arc::new(|_name| {
                Some(TransportEntry {
                    kind: "http".to_string(),
                    options: serde_json::Value::Null,
                })
            }),
            TransportContext::default(),
            RuntimeConfig::default(),
        );

        assert!(
            cache
                .on_subgraph_execute("products", ExecutionRequest::new("{ x }"))
                .await
                .is_err()
        );
        // The placeholder `OnceCell` itself stays in the map (that's what
        // lets the next call retry); only its *contents* are never filled.
        assert_eq!(cache.cached_len(), 1);
    }

    struct SlowTransport;

    #[async_trait]
    impl crate::executor::Transport for SlowTransport {
        async fn get_subgraph_executor(
            &self,
            _ctx: SubgraphExecCtx,
        ) -> Result<Arc<dyn Executor>, BoxError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(Arc::new(CountingExecutor))
        }
    }

    #[tokio::test]
    async fn construction_slower_than_the_configured_timeout_fails() {
        let mut map: HashMap<String, Arc<dyn crate::executor::Transport>> = HashMap::new();
        map.insert("http".to_string(), Arc::new(SlowTransport));
        let registry = TransportRegistry::new(Some(TransportSource::Map(Arc::new(map))));
        let cache = ExecutorCache::new(
            registry,
            Arc::new(Vec::new()),
            Arc::new(DisposableStack::new()),
            Arc::new(|_name| SubgraphSchema(Arc::from("type Query { x: Int }"))),
            Arc::new(|_name| {
                Some(TransportEntry {
                    kind: "http".to_string(),
                    options: serde_json::Value::Null,
                })
            }),
            TransportContext::default(),
            RuntimeConfig {
                executor_construction_timeout: Duration::from_millis(5),
                ..RuntimeConfig::default()
            },
        );

        let err = cache
            .on_subgraph_execute("products", ExecutionRequest::new("{ x }"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("construction timeout"));
        // Same retry-on-failure discipline as any other init failure.
        assert_eq!(cache.cached_len(), 1);
    }
}
