//! Wraps an [`Executor`] with a subgraph's ordered hook chain.
//!
//! This is the runtime's core algorithm: run every pre-hook in order before
//! the executor, run every returned done hook in order after it, and — for
//! a streaming result — wire any `on_next`/`on_end` observers into the
//! stream itself so they fire exactly once, even if the consumer abandons
//! the stream before it completes.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::task::Context;
use std::task::Poll;

use async_trait::async_trait;
use futures::stream::Stream;
use futures::stream::StreamExt;
use pin_project::pin_project;
use pin_project::pinned_drop;
use tower::BoxError;
use tracing::Instrument;

use super::DoneHookContext;
use super::HookState;
use super::OnEnd;
use super::OnNext;
use super::OnSubgraphExecuteDoneHook;
use super::OnSubgraphExecuteHook;
use super::PreHookContext;
use super::StreamObservers;
use super::StreamOutcome;
use crate::executor::Executor;
use crate::executor::SubgraphExecCtx;
use crate::request::BoxResultStream;
use crate::request::ExecutionRequest;
use crate::request::ExecutionResult;
use crate::request::ExecutionSingleResult;
use crate::request::GraphQLError;

/// Wraps `executor` with `hooks`, bound to one subgraph's context.
///
/// Returns `executor` unchanged if there are no hooks: a subgraph with no
/// configured hooks pays nothing for the pipeline. `request_tracing` mirrors
/// [`crate::config::RuntimeConfig::request_tracing`]: when false, no
/// per-request span is created around the hook chain and executor call.
pub fn wrap_executor_with_hooks(
    executor: Arc<dyn Executor>,
    hooks: Arc<Vec<Arc<dyn OnSubgraphExecuteHook>>>,
    subgraph_ctx: SubgraphExecCtx,
    request_tracing: bool,
) -> Arc<dyn Executor> {
    if hooks.is_empty() {
        return executor;
    }
    Arc::new(HookedExecutor {
        executor,
        hooks,
        subgraph_ctx,
        request_tracing,
    })
}

struct HookedExecutor {
    executor: Arc<dyn Executor>,
    hooks: Arc<Vec<Arc<dyn OnSubgraphExecuteHook>>>,
    subgraph_ctx: SubgraphExecCtx,
    request_tracing: bool,
}

#[async_trait]
impl Executor for HookedExecutor {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult, BoxError> {
        if !self.request_tracing {
            return self.run(request).await;
        }
        let span = tracing::info_span!(
            "subgraph_execute",
            subgraph.name = %self.subgraph_ctx.subgraph_name,
            request.id = %request.id,
        );
        self.run(request).instrument(span).await
    }

    fn disposer(&self) -> Option<Arc<dyn crate::executor::Disposable>> {
        self.executor.disposer()
    }
}

impl HookedExecutor {
    async fn run(&self, request: ExecutionRequest) -> Result<ExecutionResult, BoxError> {
        let mut state = HookState {
            execution_request: request,
            executor: self.executor.clone(),
        };
        let mut done_hooks: Vec<Arc<dyn OnSubgraphExecuteDoneHook>> = Vec::new();

        for hook in self.hooks.iter() {
            let mut ctx = PreHookContext::new(&self.subgraph_ctx, &mut state);
            match hook.on_execute(&mut ctx).await {
                Ok(Some(done_hook)) => done_hooks.push(done_hook),
                Ok(None) => {}
                Err(err) => {
                    // A pre-hook failure aborts the remainder of the chain
                    // (the executor never runs), but done hooks already
                    // queued still get to observe an error-shaped result so
                    // their `on_end` fires, per the "exactly once" guarantee.
                    let message = err.to_string();
                    self.notify_done_hooks_of_abort(done_hooks, &message).await;
                    return Err(Box::new(crate::error::RuntimeError::Hook {
                        subgraph_name: self.subgraph_ctx.subgraph_name.to_string(),
                        source: err,
                    }));
                }
            }
        }

        let executor = state.executor;
        let execution_request = state.execution_request;
        let result = match executor.execute(execution_request).await {
            Ok(result) => result,
            Err(err) => {
                let message = err.to_string();
                self.notify_done_hooks_of_abort(done_hooks, &message).await;
                return Err(Box::new(crate::error::RuntimeError::TransportExecution {
                    subgraph_name: self.subgraph_ctx.subgraph_name.to_string(),
                    source: err,
                }));
            }
        };

        let mut result = result;
        let mut on_next_observers = Vec::new();
        let mut on_end_observers = Vec::new();
        for done_hook in &done_hooks {
            let mut ctx = DoneHookContext::new(result);
            let observers = done_hook.on_done(&mut ctx).await?;
            result = ctx.into_result();
            if let Some(StreamObservers { on_next, on_end }) = observers {
                if let Some(on_next) = on_next {
                    on_next_observers.push(on_next);
                }
                if let Some(on_end) = on_end {
                    on_end_observers.push(on_end);
                }
            }
        }

        match result {
            ExecutionResult::Single(single) => {
                // A non-stream result is "fully consumed" the moment it is
                // returned, so any registered `on_end` observers fire now.
                if !on_end_observers.is_empty() {
                    for observer in &on_end_observers {
                        observer.on_end(&StreamOutcome::Completed).await;
                    }
                }
                Ok(ExecutionResult::Single(single))
            }
            ExecutionResult::Stream(stream) => {
                if on_next_observers.is_empty() && on_end_observers.is_empty() {
                    return Ok(ExecutionResult::Stream(stream));
                }
                Ok(ExecutionResult::Stream(wrap_stream(
                    stream,
                    on_next_observers,
                    on_end_observers,
                )))
            }
        }
    }

    /// Gives every already-queued done hook a chance to observe an
    /// error-shaped result (so any `on_end` it registers still fires)
    /// before the real error is propagated to the caller.
    async fn notify_done_hooks_of_abort(
        &self,
        done_hooks: Vec<Arc<dyn OnSubgraphExecuteDoneHook>>,
        message: &str,
    ) {
        let error_result = ExecutionResult::single(ExecutionSingleResult::from_error(
            GraphQLError::new(message.to_string()),
        ));
        let outcome = StreamOutcome::Errored(Arc::from(message));
        let mut result = error_result;
        for done_hook in &done_hooks {
            let mut ctx = DoneHookContext::new(result);
            let observers = done_hook.on_done(&mut ctx).await.ok().flatten();
            result = ctx.into_result();
            if let Some(StreamObservers { on_end, .. }) = observers {
                if let Some(on_end) = on_end {
                    on_end.on_end(&outcome).await;
                }
            }
        }
    }
}

/// Runs every `on_next` observer, in order, over each item before yielding
/// it, then hands the transformed stream to [`EndHookedStream`] so every
/// `on_end` observer fires exactly once regardless of how the stream ends.
fn wrap_stream(
    inner: BoxResultStream,
    on_next: Vec<Arc<dyn OnNext>>,
    on_end: Vec<Arc<dyn OnEnd>>,
) -> BoxResultStream {
    let transformed: BoxResultStream = if on_next.is_empty() {
        inner
    } else {
        let on_next = Arc::new(on_next);
        Box::pin(inner.then(move |mut item| {
            let on_next = on_next.clone();
            async move {
                for observer in on_next.iter() {
                    // Per-item transforms are best-effort: an observer error
                    // is folded into the item as an in-band GraphQL error
                    // rather than terminating the stream early, since there
                    // is no error channel on `ExecutionSingleResult` items.
                    if let Err(err) = observer.on_next(&mut item).await {
                        item.errors.push(GraphQLError::new(err.to_string()));
                    }
                }
                item
            }
        }))
    };

    if on_end.is_empty() {
        return transformed;
    }

    Box::pin(EndHookedStream::new(transformed, on_end))
}

/// A stream wrapper that fires every `on_end` observer, in registration
/// order, exactly once — on natural completion, or on drop if the consumer
/// abandons the stream first.
///
/// `on_end` is async, so firing it from `Drop` can't be awaited directly;
/// the cancellation path spawns a detached task instead. The `fired` flag is
/// shared so natural completion and drop-before-end can't both fire it.
#[pin_project(PinnedDrop)]
struct EndHookedStream<S> {
    #[pin]
    inner: S,
    on_end: Option<Vec<Arc<dyn OnEnd>>>,
    fired: Arc<AtomicBool>,
}

#[pinned_drop]
impl<S> PinnedDrop for EndHookedStream<S> {
    fn drop(self: Pin<&mut Self>) {
        let this = self.project();
        if let Some(observers) = this.on_end.take() {
            if !this.fired.swap(true, Ordering::SeqCst) {
                spawn_on_end(observers, StreamOutcome::Cancelled);
            }
        }
    }
}

impl<S> EndHookedStream<S> {
    fn new(inner: S, on_end: Vec<Arc<dyn OnEnd>>) -> Self {
        Self {
            inner,
            on_end: Some(on_end),
            fired: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<S> Stream for EndHookedStream<S>
where
    S: Stream<Item = ExecutionSingleResult>,
{
    type Item = ExecutionSingleResult;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(None) => {
                if let Some(observers) = this.on_end.take() {
                    if !this.fired.swap(true, Ordering::SeqCst) {
                        spawn_on_end(observers, StreamOutcome::Completed);
                    }
                }
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

fn spawn_on_end(observers: Vec<Arc<dyn OnEnd>>, outcome: StreamOutcome) {
    tokio::spawn(async move {
        for observer in &observers {
            observer.on_end(&outcome).await;
        }
    });
}
