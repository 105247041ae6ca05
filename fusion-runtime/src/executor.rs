//! The `Transport` / `Executor` contract that transport crates implement,
//! and the per-subgraph context passed to a transport's factory method.

use std::sync::Arc;

use async_trait::async_trait;
use tower::BoxError;

use crate::context::TransportContext;
use crate::request::ExecutionRequest;
use crate::request::ExecutionResult;
use crate::subgraph_name::SubgraphName;

/// The subgraph's SDL, as known to the runtime at the moment a getter is
/// called. Kept as plain text rather than a parsed schema type so this crate
/// doesn't need to depend on a GraphQL AST library; `fusion-federation`
/// parses it when it needs to.
#[derive(Debug, Clone)]
pub struct SubgraphSchema(pub Arc<str>);

/// Transport-specific connection options for one subgraph (URL, headers,
/// TLS config, ...). Opaque to the core: transports interpret their own
/// `options` value.
#[derive(Debug, Clone)]
pub struct TransportEntry {
    pub kind: String,
    pub options: serde_json::Value,
}

/// Per-subgraph context built once, the first time a subgraph is executed.
///
/// `subgraph` and `transport_entry` are *late-bound*: they read through a
/// getter closure each time, not a value captured at construction, so a
/// supergraph hot-reload after the first call is still observable to a
/// transport that re-reads them.
#[derive(Clone)]
pub struct SubgraphExecCtx {
    pub subgraph_name: SubgraphName,
    subgraph_getter: Arc<dyn Fn() -> SubgraphSchema + Send + Sync>,
    transport_entry_getter: Arc<dyn Fn() -> Option<TransportEntry> + Send + Sync>,
    pub transport_context: TransportContext,
}

impl SubgraphExecCtx {
    pub fn new(
        subgraph_name: SubgraphName,
        subgraph_getter: Arc<dyn Fn() -> SubgraphSchema + Send + Sync>,
        transport_entry_getter: Arc<dyn Fn() -> Option<TransportEntry> + Send + Sync>,
        transport_context: TransportContext,
    ) -> Self {
        Self {
            subgraph_name,
            subgraph_getter,
            transport_entry_getter,
            transport_context,
        }
    }

    pub fn subgraph(&self) -> SubgraphSchema {
        (self.subgraph_getter)()
    }

    pub fn transport_entry(&self) -> Option<TransportEntry> {
        (self.transport_entry_getter)()
    }
}

/// An executor that owns a disposable resource (a connection pool, a
/// subscription transport, ...). The runtime disposes it at shutdown.
#[async_trait]
pub trait Disposable: Send + Sync {
    async fn dispose(&self) -> Result<(), BoxError>;
}

/// An executor: the callable a transport hands back, taking one
/// `ExecutionRequest` and returning a single result or a result stream.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult, BoxError>;

    /// A disposer for this executor's own resources, if it owns any that
    /// need explicit teardown at shutdown. Most executors return `None`;
    /// the lazy cache checks this once, right after construction.
    fn disposer(&self) -> Option<Arc<dyn Disposable>> {
        None
    }
}

#[async_trait]
impl<F> Executor for F
where
    F: Fn(ExecutionRequest) -> crate::request::ExecutionFuture<'static> + Send + Sync,
{
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult, BoxError> {
        (self)(request).await
    }
}

/// A transport factory: given a subgraph's context, produce an `Executor`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_subgraph_executor(
        &self,
        ctx: SubgraphExecCtx,
    ) -> Result<Arc<dyn Executor>, BoxError>;
}
