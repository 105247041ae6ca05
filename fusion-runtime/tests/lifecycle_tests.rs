//! End-to-end exercises of a [`FusionRuntime`] assembled the way a host
//! application would assemble one, rather than poking at its internal
//! pieces directly.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use fusion_runtime::DoneHookContext;
use fusion_runtime::Executor;
use fusion_runtime::ExecutionRequest;
use fusion_runtime::ExecutionResult;
use fusion_runtime::ExecutionSingleResult;
use fusion_runtime::FusionRuntime;
use fusion_runtime::OnSubgraphExecuteDoneHook;
use fusion_runtime::OnSubgraphExecuteHook;
use fusion_runtime::PreHookContext;
use fusion_runtime::StreamObservers;
use fusion_runtime::SubgraphExecCtx;
use fusion_runtime::SubgraphName;
use fusion_runtime::SubgraphSchema;
use fusion_runtime::Transport;
use fusion_runtime::TransportEntry;
use fusion_runtime::TransportSource;
use tower::BoxError;

struct StaticTransport;

struct StaticExecutor;

#[async_trait]
impl Executor for StaticExecutor {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult, BoxError> {
        Ok(ExecutionResult::single(ExecutionSingleResult::from_data(
            serde_json_bytes::json!({ "echo": request.document }),
        )))
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn get_subgraph_executor(
        &self,
        _ctx: SubgraphExecCtx,
    ) -> Result<Arc<dyn Executor>, BoxError> {
        Ok(Arc::new(StaticExecutor))
    }
}

fn products_only_runtime(hooks: Vec<Arc<dyn OnSubgraphExecuteHook>>) -> FusionRuntime {
    let mut transports: HashMap<String, Arc<dyn Transport>> = HashMap::new();
    transports.insert("http".to_string(), Arc::new(StaticTransport));

    FusionRuntime::builder()
        .transports(TransportSource::Map(Arc::new(transports)))
        .hooks(hooks)
        .subgraph_getter(Arc::new(|_name: &SubgraphName| {
            SubgraphSchema(Arc::from("type Query { hello: String }"))
        }))
        .transport_entry_getter(Arc::new(|name: &SubgraphName| {
            if name.as_str().eq_ignore_ascii_case("products") {
                Some(TransportEntry {
                    kind: "http".to_string(),
                    options: serde_json::Value::Null,
                })
            } else {
                None
            }
        }))
        .build()
}

#[tokio::test]
async fn routes_a_known_subgraph_and_rejects_an_unknown_one() {
    let runtime = products_only_runtime(Vec::new());

    let ok = runtime
        .on_subgraph_execute("products", ExecutionRequest::new("{ hello }"))
        .await
        .unwrap();
    match ok {
        ExecutionResult::Single(single) => {
            assert_eq!(single.data.unwrap()["echo"], "{ hello }");
        }
        _ => panic!("expected a single result"),
    }

    let missing = runtime
        .on_subgraph_execute("reviews", ExecutionRequest::new("{ hello }"))
        .await;
    assert!(missing.is_err());
}

#[tokio::test]
async fn subgraph_names_route_case_insensitively() {
    let runtime = products_only_runtime(Vec::new());

    for name in ["products", "PRODUCTS", "Products"] {
        let result = runtime
            .on_subgraph_execute(name, ExecutionRequest::new("{ hello }"))
            .await
            .unwrap();
        assert!(!result.is_stream());
    }
}

struct CountingHook {
    calls: Arc<AtomicUsize>,
}

struct CountingDoneHook {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl OnSubgraphExecuteHook for CountingHook {
    async fn on_execute(
        &self,
        _ctx: &mut PreHookContext<'_>,
    ) -> Result<Option<Arc<dyn OnSubgraphExecuteDoneHook>>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Arc::new(CountingDoneHook {
            calls: self.calls.clone(),
        })))
    }
}

#[async_trait]
impl OnSubgraphExecuteDoneHook for CountingDoneHook {
    async fn on_done(
        &self,
        _ctx: &mut DoneHookContext,
    ) -> Result<Option<StreamObservers>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

#[tokio::test]
async fn hooks_run_once_per_request_after_the_executor_is_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let runtime = products_only_runtime(vec![Arc::new(CountingHook {
        calls: calls.clone(),
    })]);

    for _ in 0..3 {
        runtime
            .on_subgraph_execute("products", ExecutionRequest::new("{ hello }"))
            .await
            .unwrap();
    }

    // Two calls (on_execute + on_done) per request, across three requests,
    // even though the executor itself is only built once.
    assert_eq!(calls.load(Ordering::SeqCst), 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_for_the_same_subgraph_all_succeed() {
    let runtime = Arc::new(products_only_runtime(Vec::new()));
    let mut handles = Vec::new();
    for _ in 0..16 {
        let runtime = runtime.clone();
        handles.push(tokio::spawn(async move {
            runtime
                .on_subgraph_execute("products", ExecutionRequest::new("{ hello }"))
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    runtime.shutdown().await.unwrap();
}
