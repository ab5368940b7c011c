//! Request routing and response shaping.
//!
//! Routing is a pure function of `(method, path)`:
//!
//! | Request            | Outcome                                       |
//! |--------------------|-----------------------------------------------|
//! | `OPTIONS *`        | 200, empty body, no store access              |
//! | `GET /tasks`       | 200 with every task, newest first             |
//! | `POST /tasks`      | 201 with the created task                     |
//! | `GET /health`      | 200 `{"status":"healthy"}` when enabled       |
//! | other `/tasks`     | 405 `METHOD_NOT_ALLOWED`                      |
//! | anything else      | 404 `ROUTE_NOT_FOUND`                         |
//!
//! Errors and panics are converted to the error envelope here and nowhere
//! else.

use super::{
    diagnostics::{Diagnostics, ReportContext},
    error::ApiError,
    request::{MalformedRequest, Method, RawRequest, ValidatedRequest, validate},
    response::{ApiResponse, CorsPolicy, ErrorEnvelope},
};
use crate::task::{
    ports::TaskStore,
    services::{CreateTaskRequest, TaskService},
};
use futures::FutureExt;
use mockable::{Clock, DefaultClock};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Path of the task collection.
pub const TASKS_PATH: &str = "/tasks";

/// Path of the liveness probe served by the local server.
pub const HEALTH_PATH: &str = "/health";

const TASKS_METHODS: [&str; 3] = ["GET", "POST", "OPTIONS"];
const HEALTH_METHODS: [&str; 2] = ["GET", "OPTIONS"];

/// Request-handling core shared by all deployment shapes.
pub struct TaskApi<S, C = DefaultClock>
where
    S: TaskStore,
{
    service: TaskService<S>,
    cors: CorsPolicy,
    diagnostics: Diagnostics,
    clock: Arc<C>,
    health_route: bool,
}

/// Per-request context collected while dispatching, for diagnostics.
#[derive(Debug)]
struct RequestScope {
    route: String,
    params: Value,
}

impl<S, C> TaskApi<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    /// Creates a handler without the `/health` route.
    #[must_use]
    pub const fn new(
        service: TaskService<S>,
        cors: CorsPolicy,
        diagnostics: Diagnostics,
        clock: Arc<C>,
    ) -> Self {
        Self {
            service,
            cors,
            diagnostics,
            clock,
            health_route: false,
        }
    }

    /// Enables `GET /health`.
    #[must_use]
    pub fn with_health_route(mut self) -> Self {
        self.health_route = true;
        self
    }

    /// Returns the task service.
    #[must_use]
    pub const fn service(&self) -> &TaskService<S> {
        &self.service
    }

    /// Returns the CORS policy applied to every response.
    #[must_use]
    pub const fn cors(&self) -> &CorsPolicy {
        &self.cors
    }

    /// Handles one request.
    ///
    /// Never fails: every error, including a panic while dispatching, is
    /// reported and turned into an error response.
    pub async fn handle(&self, raw: RawRequest, request_id: &str) -> ApiResponse {
        let mut scope = RequestScope {
            route: raw.route_label(),
            params: Value::Object(Map::new()),
        };
        let outcome = AssertUnwindSafe(self.dispatch(raw, &mut scope))
            .catch_unwind()
            .await;
        let result = outcome.unwrap_or_else(|panic| {
            error!(request_id, route = %scope.route, "request handler panicked");
            Err(ApiError::Internal(panic_message(panic.as_ref())))
        });

        match result {
            Ok(response) => {
                info!(request_id, route = %scope.route, status = response.status, "request handled");
                response
            }
            Err(err) => self.fail(&err, request_id, &scope),
        }
    }

    /// Answers a request that could not be turned into a [`RawRequest`].
    #[must_use]
    pub fn reject(&self, err: MalformedRequest, request_id: &str) -> ApiResponse {
        let scope = RequestScope {
            route: "unknown".to_owned(),
            params: Value::Object(Map::new()),
        };
        self.fail(&ApiError::from(err), request_id, &scope)
    }

    async fn dispatch(
        &self,
        raw: RawRequest,
        scope: &mut RequestScope,
    ) -> Result<ApiResponse, ApiError> {
        let request = validate(raw)?;
        scope.route = format!("{} {}", request.method(), request.path());
        debug!(route = %scope.route, "validated request");

        if *request.method() == Method::Options {
            return Ok(ApiResponse::empty(200, &self.cors));
        }

        match request.path() {
            TASKS_PATH => self.dispatch_tasks(&request, scope).await,
            HEALTH_PATH if self.health_route => self.dispatch_health(&request),
            path => Err(ApiError::RouteNotFound {
                path: path.to_owned(),
                available: self.available_routes(),
            }),
        }
    }

    async fn dispatch_tasks(
        &self,
        request: &ValidatedRequest,
        scope: &mut RequestScope,
    ) -> Result<ApiResponse, ApiError> {
        match request.method() {
            Method::Get => {
                let tasks = self.service.list_tasks().await?;
                self.json(200, &tasks)
            }
            Method::Post => {
                let payload = parse_body(request.body())?;
                scope.params = payload.clone();
                let task = self
                    .service
                    .create_task(create_request_from(&payload))
                    .await?;
                self.json(201, &task)
            }
            other => Err(ApiError::MethodNotAllowed {
                method: other.to_string(),
                path: TASKS_PATH.to_owned(),
                allowed: TASKS_METHODS.to_vec(),
            }),
        }
    }

    fn dispatch_health(&self, request: &ValidatedRequest) -> Result<ApiResponse, ApiError> {
        match request.method() {
            Method::Get => self.json(200, &json!({ "status": "healthy" })),
            other => Err(ApiError::MethodNotAllowed {
                method: other.to_string(),
                path: HEALTH_PATH.to_owned(),
                allowed: HEALTH_METHODS.to_vec(),
            }),
        }
    }

    fn available_routes(&self) -> Vec<&'static str> {
        if self.health_route {
            vec![TASKS_PATH, HEALTH_PATH]
        } else {
            vec![TASKS_PATH]
        }
    }

    fn json<T: Serialize + ?Sized>(&self, status: u16, payload: &T) -> Result<ApiResponse, ApiError> {
        ApiResponse::json(status, payload, &self.cors)
            .map_err(|err| ApiError::Internal(format!("failed to encode response: {err}")))
    }

    fn fail(&self, err: &ApiError, request_id: &str, scope: &RequestScope) -> ApiResponse {
        if err.is_server_error() {
            error!(request_id, route = %scope.route, code = err.code(), error = %err, "request failed");
        } else {
            warn!(request_id, route = %scope.route, code = err.code(), error = %err, "request rejected");
        }
        self.diagnostics.report(
            err,
            &ReportContext {
                request_id,
                route: &scope.route,
                params: &scope.params,
            },
        );
        self.error_response(err, request_id)
    }

    fn error_response(&self, err: &ApiError, request_id: &str) -> ApiResponse {
        let envelope = ErrorEnvelope {
            error: err.title().to_owned(),
            message: err.to_string(),
            code: err.code().to_owned(),
            request_id: request_id.to_owned(),
            timestamp: ErrorEnvelope::format_timestamp(self.clock.utc()),
            details: err.details(),
        };
        ApiResponse::json(err.status(), &envelope, &self.cors).unwrap_or_else(|encode_err| {
            error!(request_id, error = %encode_err, "failed to encode error envelope");
            let mut fallback = ApiResponse::empty(500, &self.cors);
            fallback.body = r#"{"error":"Internal server error","code":"INTERNAL_ERROR"}"#.to_owned();
            fallback
        })
    }
}

/// Parses a request body as JSON; an absent or blank body reads as `{}`.
fn parse_body(body: Option<&[u8]>) -> Result<Value, ApiError> {
    match body {
        Some(bytes) if !bytes.trim_ascii().is_empty() => {
            serde_json::from_slice(bytes).map_err(|err| ApiError::InvalidJson(err.to_string()))
        }
        _ => Ok(Value::Object(Map::new())),
    }
}

/// Extracts the creation fields; a non-string description counts as absent.
fn create_request_from(payload: &Value) -> CreateTaskRequest {
    payload
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .into()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "request handler panicked".to_owned())
}
