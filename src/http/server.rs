//! Local HTTP server.

use crate::api::{ApiResponse, RawRequest, TaskApi};
use crate::config::ServerConfig;
use crate::task::ports::TaskStore;
use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use mockable::Clock;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Header carrying a caller-supplied request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Builds the router: every request is forwarded to `api`.
pub fn router<S, C>(api: Arc<TaskApi<S, C>>) -> Router
where
    S: TaskStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    Router::new()
        .fallback(forward::<S, C>)
        .with_state(api)
        .layer(TraceLayer::new_for_http())
}

/// Serves `api` until Ctrl-C is received.
///
/// # Errors
///
/// Returns the I/O error when binding or serving fails.
pub async fn serve<S, C>(api: Arc<TaskApi<S, C>>, config: &ServerConfig) -> std::io::Result<()>
where
    S: TaskStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    let listener = TcpListener::bind((config.host(), config.port())).await?;
    info!(addr = %listener.local_addr()?, "taskboard server listening");
    axum::serve(listener, router(api))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}

async fn forward<S, C>(
    State(api): State<Arc<TaskApi<S, C>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: TaskStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    let request_id = request_id_from(&headers);
    let raw = RawRequest {
        method: Some(method.as_str().to_owned()),
        path: Some(uri.path().to_owned()),
        body: (!body.is_empty()).then(|| body.to_vec()),
    };
    into_response(api.handle(raw, &request_id).await)
}

fn request_id_from(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned)
}

fn into_response(response: ApiResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = Response::builder().status(status);
    for (name, value) in &response.headers {
        builder = builder.header(name, value);
    }
    builder.body(Body::from(response.body)).unwrap_or_else(|err| {
        error!(error = %err, "failed to build HTTP response");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}
