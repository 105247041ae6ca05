//! The request/result types that flow through a single subgraph call.

use std::fmt;
use std::pin::Pin;

use futures::stream::Stream;
use serde_json_bytes::Map as JsonMap;
use serde_json_bytes::Value;
use tower::BoxError;

/// Unique id for one subgraph request, threaded through logging and tracing.
///
/// Unlike the reference system, which recovers this from a weak association
/// keyed by the request object, `ExecutionRequest` simply owns it: Rust's
/// ownership model makes the side-table unnecessary (see DESIGN.md).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        RequestId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A parsed, already-validated GraphQL operation bound for one subgraph,
/// plus the caller context carried through the hook pipeline.
///
/// The host supplies `document`/`variables`/`operation_name`; the core never
/// parses or validates them (see Non-goals).
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub id: RequestId,
    /// The operation document text, already parsed and validated upstream.
    pub document: String,
    pub operation_name: Option<String>,
    pub variables: JsonMap<serde_json_bytes::ByteString, Value>,
    /// Arbitrary host-supplied resolver info, re-exposed to subgraph resolvers.
    pub info: ResolverInfo,
    pub root_value: Option<Value>,
}

impl ExecutionRequest {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            document: document.into(),
            operation_name: None,
            variables: JsonMap::new(),
            info: ResolverInfo::default(),
            root_value: None,
        }
    }
}

/// Resolver-facing metadata carried alongside a request.
///
/// The reference system additionally back-attaches the owning request onto
/// `info.executionRequest` so nested resolvers can recover it; that trick
/// exists only because the source language lacks a cheap way to pass an
/// owned field through. Here `ExecutionRequest` already carries its own
/// `id`, so no self-reference is needed (see DESIGN.md).
#[derive(Debug, Clone, Default)]
pub struct ResolverInfo {
    pub field_name: Option<String>,
    pub path: Vec<String>,
}

/// One GraphQL execution result: `data`/`errors`/`extensions`.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct ExecutionSingleResult {
    pub data: Option<Value>,
    pub errors: Vec<GraphQLError>,
    pub extensions: JsonMap<serde_json_bytes::ByteString, Value>,
}

impl ExecutionSingleResult {
    pub fn from_data(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn from_error(error: GraphQLError) -> Self {
        Self {
            errors: vec![error],
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphQLError {
    pub message: String,
    pub path: Vec<String>,
    pub extensions: JsonMap<serde_json_bytes::ByteString, Value>,
}

impl GraphQLError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
            extensions: JsonMap::new(),
        }
    }
}

pub type BoxResultStream = Pin<Box<dyn Stream<Item = ExecutionSingleResult> + Send>>;

/// Either a single result or a subscription stream of results.
///
/// This is the `Result | AsyncStream<Result>` union from the spec, made
/// explicit as a Rust enum instead of relying on runtime type inspection.
pub enum ExecutionResult {
    Single(ExecutionSingleResult),
    Stream(BoxResultStream),
}

impl ExecutionResult {
    pub fn single(result: ExecutionSingleResult) -> Self {
        ExecutionResult::Single(result)
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, ExecutionResult::Stream(_))
    }
}

impl fmt::Debug for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionResult::Single(r) => f.debug_tuple("Single").field(r).finish(),
            ExecutionResult::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

pub type ExecutionFuture<'a> =
    Pin<Box<dyn std::future::Future<Output = Result<ExecutionResult, BoxError>> + Send + 'a>>;
