//! Process-level wiring.
//!
//! The store is constructed once at process start and handed to the
//! request-handling core explicitly; dropping the returned handler closes the
//! pool.

use crate::api::{CorsPolicy, Diagnostics, TaskApi};
use crate::config::AppConfig;
use crate::task::{
    adapters::{postgres::PostgresTaskStore, tracing_sink::TracingErrorSink},
    services::TaskService,
};
use mockable::DefaultClock;
use std::sync::Arc;
use tracing::info;

/// Deployment shape the handler is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    /// Function entry point driven by API Gateway events.
    Function,
    /// Conventional local HTTP server, which also serves `/health`.
    LocalServer,
}

/// Builds the `PostgreSQL`-backed handler for `deployment`.
#[must_use]
pub fn postgres_api(config: &AppConfig, deployment: Deployment) -> TaskApi<PostgresTaskStore> {
    let database = &config.database;
    info!(
        host = database.host(),
        port = database.port(),
        database = database.database(),
        user = database.user(),
        ssl_mode = database.ssl_mode().as_str(),
        pool_size = database.pool_size(),
        ?deployment,
        "starting with database configuration"
    );

    let store = Arc::new(PostgresTaskStore::connect(database));
    let service = TaskService::new(store, config.retry);
    let sink = TracingErrorSink::new(&config.diagnostics);
    info!(sink = sink.target(), environment = config.diagnostics.environment(), "error reporting configured");

    let api = TaskApi::new(
        service,
        CorsPolicy::new(config.allowed_origin.clone()),
        Diagnostics::new(Arc::new(sink)),
        Arc::new(DefaultClock),
    );
    match deployment {
        Deployment::Function => api,
        Deployment::LocalServer => api.with_health_route(),
    }
}
