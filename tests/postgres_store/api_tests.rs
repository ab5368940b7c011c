//! Request-handling tests over a real `PostgreSQL` database.

use std::sync::Arc;

use crate::postgres_store::cluster::{
    PostgresCluster, TemporaryDatabase, postgres_cluster, test_runtime,
};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::Value;
use taskboard::{
    api::{CorsPolicy, Diagnostics, RawRequest, TaskApi},
    config::DiagnosticsConfig,
    task::{
        adapters::tracing_sink::TracingErrorSink,
        services::{RetryPolicy, TaskService},
    },
};

#[rstest]
#[ignore = "downloads and starts an embedded PostgreSQL cluster"]
fn post_then_get_round_trips_through_postgres(postgres_cluster: PostgresCluster) {
    let database = TemporaryDatabase::create(postgres_cluster).expect("database created");
    let store = database.store().expect("pool builds");
    let api = TaskApi::new(
        TaskService::new(Arc::new(store), RetryPolicy::once()),
        CorsPolicy::default(),
        Diagnostics::new(Arc::new(TracingErrorSink::new(&DiagnosticsConfig::new(
            None, "test",
        )))),
        Arc::new(DefaultClock),
    );
    let rt = test_runtime().expect("tokio runtime");

    let (created, listed) = rt.block_on(async {
        let created = api
            .handle(
                RawRequest::new("POST", "/tasks").with_body(r#"{"description":"Buy milk"}"#),
                "pg-1",
            )
            .await;
        let listed = api.handle(RawRequest::new("GET", "/tasks"), "pg-2").await;
        (created, listed)
    });

    assert_eq!(created.status, 201);
    let task: Value = serde_json::from_str(&created.body).expect("task JSON");
    assert_eq!(task["description"], "Buy milk");
    assert!(task["id"].is_i64());

    assert_eq!(listed.status, 200);
    let tasks: Value = serde_json::from_str(&listed.body).expect("listing JSON");
    assert_eq!(tasks.as_array().map(Vec::len), Some(1));
}
