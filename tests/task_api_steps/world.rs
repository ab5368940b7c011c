//! Shared world state for task API BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use serde_json::Value;
use taskboard::{
    api::{ApiResponse, CorsPolicy, Diagnostics, RawRequest, TaskApi},
    config::DiagnosticsConfig,
    task::{
        adapters::{memory::InMemoryTaskStore, tracing_sink::TracingErrorSink},
        services::{RetryPolicy, TaskService},
    },
};

/// Scenario world for task API behaviour tests.
pub struct TaskApiWorld {
    pub store: InMemoryTaskStore,
    pub api: TaskApi<InMemoryTaskStore>,
    pub last_response: Option<ApiResponse>,
}

impl TaskApiWorld {
    /// Creates a world over an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        let store = InMemoryTaskStore::new();
        let api = TaskApi::new(
            TaskService::new(Arc::new(store.clone()), RetryPolicy::once()),
            CorsPolicy::default(),
            Diagnostics::new(Arc::new(TracingErrorSink::new(&DiagnosticsConfig::new(
                None, "test",
            )))),
            Arc::new(DefaultClock),
        );
        Self {
            store,
            api,
            last_response: None,
        }
    }

    /// Sends a request and keeps the response for later steps.
    pub fn send(&mut self, raw: RawRequest) -> &ApiResponse {
        let response = run_async(self.api.handle(raw, "bdd-request"));
        self.last_response.insert(response)
    }

    /// Returns the last response as JSON.
    pub fn last_body(&self) -> Result<Value, eyre::Report> {
        let response = self
            .last_response
            .as_ref()
            .ok_or_else(|| eyre::eyre!("no request has been sent in this scenario"))?;
        serde_json::from_str(&response.body)
            .map_err(|err| eyre::eyre!("response body is not JSON: {err}"))
    }
}

impl Default for TaskApiWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskApiWorld {
    TaskApiWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
