//! Fetches a federated subgraph's own SDL via its conventional
//! `_service { sdl }` field.

use fusion_runtime::Executor;
use fusion_runtime::ExecutionRequest;
use fusion_runtime::ExecutionResult;

use crate::error::MergeError;

pub const SERVICE_DEFINITION_OPERATION_NAME: &str = "__ApolloGetServiceDefinition__";

fn service_definition_query() -> String {
    format!("query {SERVICE_DEFINITION_OPERATION_NAME} {{ _service {{ sdl }} }}")
}

/// Issues the service-definition query against `executor` and extracts the
/// returned SDL string.
pub async fn fetch_sdl(executor: &dyn Executor, subgraph_name: &str) -> Result<String, MergeError> {
    let mut request = ExecutionRequest::new(service_definition_query());
    request.operation_name = Some(SERVICE_DEFINITION_OPERATION_NAME.to_string());

    let result = executor
        .execute(request)
        .await
        .map_err(|source| MergeError::SdlFetch {
            subgraph_name: subgraph_name.to_string(),
            source,
        })?;

    let single = match result {
        ExecutionResult::Single(single) => single,
        ExecutionResult::Stream(_) => {
            return Err(MergeError::MalformedServiceResponse {
                subgraph_name: subgraph_name.to_string(),
            });
        }
    };

    if let Some(error) = single.errors.first() {
        return Err(MergeError::SdlFetch {
            subgraph_name: subgraph_name.to_string(),
            source: error.message.clone().into(),
        });
    }

    single
        .data
        .as_ref()
        .and_then(|data| data.get("_service"))
        .and_then(|service| service.get("sdl"))
        .and_then(|sdl| sdl.as_str())
        .map(str::to_string)
        .ok_or_else(|| MergeError::MalformedServiceResponse {
            subgraph_name: subgraph_name.to_string(),
        })
}
