//! Local HTTP server tests driven through the router without a socket.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    response::Response,
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use taskboard::{
    api::{CorsPolicy, Diagnostics, TaskApi},
    config::DiagnosticsConfig,
    http::server::{REQUEST_ID_HEADER, router},
    task::{
        adapters::{memory::InMemoryTaskStore, tracing_sink::TracingErrorSink},
        services::{RetryPolicy, TaskService},
    },
};
use tower::ServiceExt;
use uuid::Uuid;

struct Server {
    store: InMemoryTaskStore,
    router: Router,
}

#[fixture]
fn server() -> Server {
    let store = InMemoryTaskStore::new();
    let api = TaskApi::new(
        TaskService::new(Arc::new(store.clone()), RetryPolicy::once()),
        CorsPolicy::default(),
        Diagnostics::new(Arc::new(TracingErrorSink::new(&DiagnosticsConfig::new(
            None, "test",
        )))),
        Arc::new(DefaultClock),
    )
    .with_health_route();
    Server {
        store,
        router: router(Arc::new(api)),
    }
}

async fn call(router: &Router, request: Request<Body>) -> Response {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body is readable");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creates_and_lists_tasks(server: Server) {
    let created = call(
        &server.router,
        Request::post("/tasks")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"description":"Buy milk"}"#))
            .expect("request builds"),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(
        created
            .headers()
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );
    assert_eq!(json_body(created).await["description"], "Buy milk");

    let listed = call(
        &server.router,
        Request::get("/tasks").body(Body::empty()).expect("request builds"),
    )
    .await;
    assert_eq!(listed.status(), StatusCode::OK);
    let tasks = json_body(listed).await;
    assert_eq!(tasks.as_array().map(Vec::len), Some(1));
    assert_eq!(server.store.probe().outstanding(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn health_probe_does_not_touch_the_store(server: Server) {
    let response = call(
        &server.router,
        Request::get("/health").body(Body::empty()).expect("request builds"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "healthy" }));
    assert_eq!(server.store.probe().acquisitions(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn preflight_returns_an_empty_body(server: Server) {
    let response = call(
        &server.router,
        Request::options("/tasks")
            .header("origin", "https://app.example.com")
            .body(Body::empty())
            .expect("request builds"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-methods")
    );
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body is readable");
    assert!(bytes.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn caller_request_id_is_echoed_in_errors(server: Server) {
    let response = call(
        &server.router,
        Request::get("/missing")
            .header(REQUEST_ID_HEADER, "trace-123")
            .body(Body::empty())
            .expect("request builds"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let envelope = json_body(response).await;
    assert_eq!(envelope["code"], "ROUTE_NOT_FOUND");
    assert_eq!(envelope["requestId"], "trace-123");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn request_id_is_generated_when_absent(server: Server) {
    let response = call(
        &server.router,
        Request::delete("/tasks").body(Body::empty()).expect("request builds"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let envelope = json_body(response).await;
    let request_id = envelope["requestId"].as_str().expect("request id string");
    assert!(Uuid::parse_str(request_id).is_ok());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_json_is_rejected_before_the_store(server: Server) {
    let response = call(
        &server.router,
        Request::post("/tasks")
            .body(Body::from("{oops"))
            .expect("request builds"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "INVALID_JSON");
    assert_eq!(server.store.probe().acquisitions(), 0);
}
