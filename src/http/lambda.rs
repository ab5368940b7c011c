//! Function entry point for API Gateway HTTP API events.

use crate::api::{ApiGatewayEvent, ApiResponse, TaskApi};
use crate::task::ports::TaskStore;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Runs the Lambda runtime loop, handling each event with `api`.
///
/// # Errors
///
/// Returns the runtime error when the Lambda runtime API cannot be reached.
pub async fn run<S, C>(api: Arc<TaskApi<S, C>>) -> Result<(), Error>
where
    S: TaskStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let api = Arc::clone(&api);
        async move {
            let (payload, context) = event.into_parts();
            Ok::<_, Error>(handle_payload(&api, payload, &context.request_id).await)
        }
    }))
    .await
}

/// Handles one raw event payload.
pub async fn handle_payload<S, C>(api: &TaskApi<S, C>, payload: Value, request_id: &str) -> ApiResponse
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    debug!(request_id, "function invoked");
    match ApiGatewayEvent::from_value(payload).and_then(ApiGatewayEvent::into_raw_request) {
        Ok(raw) => api.handle(raw, request_id).await,
        Err(err) => api.reject(err, request_id),
    }
}
