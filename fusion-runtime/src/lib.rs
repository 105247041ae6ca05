//! The subgraph execution plane of a Fusion gateway: resolves a subgraph's
//! transport, lazily builds and caches its executor, and routes requests
//! through an ordered hook pipeline.
//!
//! [`FusionRuntime`] is the entry point; everything else in this crate is a
//! piece it wires together. A transport crate implements [`Transport`] and
//! registers itself with [`register_transport!`]; a host application builds
//! a [`FusionRuntime`] naming its transports, hooks, and per-subgraph
//! metadata getters, then calls [`FusionRuntime::on_subgraph_execute`] per
//! incoming subgraph request.

pub mod cache;
pub mod config;
pub mod context;
pub mod disposable;
pub mod error;
pub mod executor;
pub mod hooks;
pub mod request;
pub mod runtime;
pub mod subgraph_name;
pub mod transport;

pub use cache::ExecutorCache;
pub use config::RuntimeConfig;
pub use context::TransportContext;
pub use disposable::DisposableStack;
pub use error::RuntimeError;
pub use executor::Disposable;
pub use executor::Executor;
pub use executor::SubgraphExecCtx;
pub use executor::SubgraphSchema;
pub use executor::Transport;
pub use executor::TransportEntry;
pub use hooks::DoneHookContext;
pub use hooks::HookState;
pub use hooks::OnEnd;
pub use hooks::OnNext;
pub use hooks::OnSubgraphExecuteDoneHook;
pub use hooks::OnSubgraphExecuteHook;
pub use hooks::PreHookContext;
pub use hooks::StreamObservers;
pub use hooks::StreamOutcome;
pub use request::BoxResultStream;
pub use request::ExecutionFuture;
pub use request::ExecutionRequest;
pub use request::ExecutionResult;
pub use request::ExecutionSingleResult;
pub use request::GraphQLError;
pub use request::RequestId;
pub use request::ResolverInfo;
pub use runtime::FusionRuntime;
pub use subgraph_name::SubgraphName;
pub use transport::TransportRegistry;
pub use transport::TransportSource;
