//! Session and query tests against a real `PostgreSQL` database.

use std::sync::Arc;

use crate::postgres_store::cluster::{
    PostgresCluster, TemporaryDatabase, postgres_cluster, test_runtime,
};
use taskboard::task::{
    adapters::postgres::PostgresTaskStore,
    ports::{TaskSession, TaskStore, TaskStoreError},
    services::{CreateTaskRequest, RetryPolicy, SchemaInitializer, TaskService},
};
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

struct StoreContext {
    store: PostgresTaskStore,
    rt: Runtime,
    _database: TemporaryDatabase,
}

#[fixture]
fn store_context(postgres_cluster: PostgresCluster) -> StoreContext {
    let database = TemporaryDatabase::create(postgres_cluster).expect("database created");
    let store = database.store().expect("pool builds");
    StoreContext {
        store,
        rt: test_runtime().expect("tokio runtime"),
        _database: database,
    }
}

#[rstest]
#[ignore = "downloads and starts an embedded PostgreSQL cluster"]
fn cold_database_gains_the_table_on_first_request(store_context: StoreContext) {
    let context = store_context;
    let service = TaskService::new(Arc::new(context.store.clone()), RetryPolicy::once());

    let listed = context
        .rt
        .block_on(service.list_tasks())
        .expect("listing succeeds");

    assert!(listed.is_empty());
    let exists = context.rt.block_on(async {
        let mut session = context.store.acquire().await?;
        session.table_exists().await
    });
    assert!(matches!(exists, Ok(true)));
}

#[rstest]
#[ignore = "downloads and starts an embedded PostgreSQL cluster"]
fn created_tasks_come_back_newest_first(store_context: StoreContext) {
    let context = store_context;
    let service = TaskService::new(Arc::new(context.store.clone()), RetryPolicy::once());

    let (first, second, listed) = context.rt.block_on(async {
        let first = service.create_task(CreateTaskRequest::new("first")).await?;
        let second = service.create_task(CreateTaskRequest::new("  second  ")).await?;
        let listed = service.list_tasks().await?;
        Ok::<_, taskboard::task::services::TaskServiceError>((first, second, listed))
    })
    .expect("store operations succeed");

    assert!(second.id() > first.id());
    assert_eq!(second.description().as_str(), "  second  ");
    assert_eq!(listed, vec![second, first]);
}

#[rstest]
#[ignore = "downloads and starts an embedded PostgreSQL cluster"]
fn creating_an_existing_table_is_reported_as_such(store_context: StoreContext) {
    let context = store_context;

    let second = context.rt.block_on(async {
        let mut session = context.store.acquire().await?;
        session.create_table().await?;
        session.create_table().await
    });

    assert!(matches!(second, Err(TaskStoreError::TableAlreadyExists)));
}

#[rstest]
#[ignore = "downloads and starts an embedded PostgreSQL cluster"]
fn initializer_tolerates_a_table_created_elsewhere(store_context: StoreContext) {
    let context = store_context;
    let schema = SchemaInitializer::new();

    let result = context.rt.block_on(async {
        let mut other = context.store.acquire().await?;
        other.create_table().await?;
        let mut session = context.store.acquire().await?;
        session.ping().await?;
        schema.ensure(&mut session).await
    });

    assert!(result.is_ok());
    assert!(schema.is_ready());
}

#[rstest]
#[ignore = "downloads and starts an embedded PostgreSQL cluster"]
fn sessions_return_their_connection_to_the_pool(store_context: StoreContext) {
    let context = store_context;
    let service = TaskService::new(Arc::new(context.store.clone()), RetryPolicy::once());

    context.rt.block_on(async {
        for index in 0..10 {
            service
                .create_task(CreateTaskRequest::new(format!("task {index}")))
                .await
                .expect("create succeeds");
        }
    });

    let state = context.store.pool().state();
    assert_eq!(state.connections, state.idle_connections);
}
