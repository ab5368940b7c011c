//! Behaviour when no database answers.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::rstest;
use serde_json::Value;
use taskboard::{
    api::{CorsPolicy, Diagnostics, RawRequest, TaskApi},
    config::AppConfig,
    task::{
        adapters::{postgres::PostgresTaskStore, tracing_sink::TracingErrorSink},
        ports::{TaskStore, TaskStoreError},
        services::TaskService,
    },
};

fn unreachable_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "DB_HOST" => Some("127.0.0.1".to_owned()),
        "DB_PORT" => Some("1".to_owned()),
        "DB_CONNECT_TIMEOUT_MS" => Some("200".to_owned()),
        "DB_RETRY_ATTEMPTS" => Some("1".to_owned()),
        "DB_RETRY_DELAY_MS" => Some("0".to_owned()),
        _ => None,
    })
    .expect("valid configuration")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn acquiring_from_a_dead_server_is_a_connection_error() {
    let config = unreachable_config();
    let store = PostgresTaskStore::connect(&config.database);

    let result = store.acquire().await;

    assert!(matches!(result, Err(TaskStoreError::Connection(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn requests_against_a_dead_server_answer_500() {
    let config = unreachable_config();
    let api = TaskApi::new(
        TaskService::new(
            Arc::new(PostgresTaskStore::connect(&config.database)),
            config.retry,
        ),
        CorsPolicy::new(config.allowed_origin.clone()),
        Diagnostics::new(Arc::new(TracingErrorSink::new(&config.diagnostics))),
        Arc::new(DefaultClock),
    );

    let response = api.handle(RawRequest::new("GET", "/tasks"), "dead-1").await;

    assert_eq!(response.status, 500);
    let envelope: Value = serde_json::from_str(&response.body).expect("envelope JSON");
    assert_eq!(envelope["code"], "DB_CONNECTION_ERROR");
}
