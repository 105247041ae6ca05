//! Hook types: ordered observers that may rewrite a request, swap the
//! executor, or observe/transform a result — including per-item transforms
//! over a streaming result.

pub mod pipeline;

use std::sync::Arc;

use async_trait::async_trait;
use tower::BoxError;

use crate::executor::Executor;
use crate::executor::SubgraphExecCtx;
use crate::executor::SubgraphSchema;
use crate::executor::TransportEntry;
use crate::request::ExecutionRequest;
use crate::request::ExecutionResult;
use crate::request::ExecutionSingleResult;
use crate::request::RequestId;
use crate::subgraph_name::SubgraphName;

pub use pipeline::wrap_executor_with_hooks;

/// The mutable part of a request's trip through the pre-hook chain: the
/// request and executor a hook may replace.
///
/// Modeled as an explicit cell passed to each hook rather than captured by
/// reference, so "final executor = last `set_executor` winner" is visible
/// in the type instead of implicit in closure captures.
pub struct HookState {
    pub execution_request: ExecutionRequest,
    pub executor: Arc<dyn Executor>,
}

/// Read-only context plus the mutators a pre-hook is given.
pub struct PreHookContext<'a> {
    subgraph_ctx: &'a SubgraphExecCtx,
    state: &'a mut HookState,
}

impl<'a> PreHookContext<'a> {
    pub fn new(subgraph_ctx: &'a SubgraphExecCtx, state: &'a mut HookState) -> Self {
        Self { subgraph_ctx, state }
    }

    pub fn subgraph_name(&self) -> &SubgraphName {
        &self.subgraph_ctx.subgraph_name
    }

    pub fn subgraph(&self) -> SubgraphSchema {
        self.subgraph_ctx.subgraph()
    }

    pub fn transport_entry(&self) -> Option<TransportEntry> {
        self.subgraph_ctx.transport_entry()
    }

    pub fn request_id(&self) -> &RequestId {
        &self.state.execution_request.id
    }

    pub fn execution_request(&self) -> &ExecutionRequest {
        &self.state.execution_request
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.state.executor
    }

    pub fn set_execution_request(&mut self, request: ExecutionRequest) {
        self.state.execution_request = request;
    }

    pub fn set_executor(&mut self, executor: Arc<dyn Executor>) {
        self.state.executor = executor;
    }
}

/// A pre-hook invoked, in registration order, before the subgraph executor
/// runs. May rewrite the request or swap the executor, and may return a
/// done hook to observe the eventual result.
#[async_trait]
pub trait OnSubgraphExecuteHook: Send + Sync {
    async fn on_execute(
        &self,
        ctx: &mut PreHookContext<'_>,
    ) -> Result<Option<Arc<dyn OnSubgraphExecuteDoneHook>>, BoxError>;
}

/// The result a done hook observes, with the ability to replace it wholesale.
pub struct DoneHookContext {
    result: ExecutionResult,
}

impl DoneHookContext {
    pub fn new(result: ExecutionResult) -> Self {
        Self { result }
    }

    pub fn result(&self) -> &ExecutionResult {
        &self.result
    }

    pub fn set_result(&mut self, result: ExecutionResult) {
        self.result = result;
    }

    pub fn into_result(self) -> ExecutionResult {
        self.result
    }
}

/// How a subscription stream ended, passed to `on_end` hooks.
#[derive(Clone)]
pub enum StreamOutcome {
    Completed,
    Errored(Arc<str>),
    /// The consumer dropped the stream before it completed or errored.
    Cancelled,
}

/// Per-item transform over a streaming result.
#[async_trait]
pub trait OnNext: Send + Sync {
    async fn on_next(&self, result: &mut ExecutionSingleResult) -> Result<(), BoxError>;
}

/// Fires exactly once when a streaming result ends, regardless of why.
#[async_trait]
pub trait OnEnd: Send + Sync {
    async fn on_end(&self, outcome: &StreamOutcome);
}

/// What a pre-hook's done hook observed: an optional wholesale result
/// replacement, plus optional per-item stream observers.
#[derive(Default)]
pub struct StreamObservers {
    pub on_next: Option<Arc<dyn OnNext>>,
    pub on_end: Option<Arc<dyn OnEnd>>,
}

/// A done hook, created per-request by a pre-hook that chose to observe the
/// eventual result.
#[async_trait]
pub trait OnSubgraphExecuteDoneHook: Send + Sync {
    async fn on_done(
        &self,
        ctx: &mut DoneHookContext,
    ) -> Result<Option<StreamObservers>, BoxError>;
}
