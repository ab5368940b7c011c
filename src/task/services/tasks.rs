//! Service layer for task creation and listing.

use super::{RetryPolicy, SchemaInitializer};
use crate::task::{
    domain::{Description, NewTask, Task, TaskDomainError},
    ports::{TaskSession, TaskStore, TaskStoreError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    description: Option<String>,
}

impl CreateTaskRequest {
    /// Creates a request carrying a description.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
        }
    }

    /// Creates a request whose description field was absent.
    #[must_use]
    pub const fn without_description() -> Self {
        Self { description: None }
    }

    fn into_new_task(self) -> Result<NewTask, TaskDomainError> {
        let raw = self
            .description
            .ok_or(TaskDomainError::MissingDescription)?;
        Ok(NewTask::new(Description::new(raw)?))
    }
}

impl From<Option<String>> for CreateTaskRequest {
    fn from(description: Option<String>) -> Self {
        Self { description }
    }
}

/// Service-level errors for task operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Input validation failed; the store was not touched.
    #[error(transparent)]
    Validation(#[from] TaskDomainError),

    /// No usable connection could be obtained within the retry policy.
    #[error("database connection failed: {0}")]
    Connection(#[source] TaskStoreError),

    /// The `tasks` table could not be checked or created.
    #[error("database initialization failed: {0}")]
    SchemaInit(#[source] TaskStoreError),

    /// A query failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Task creation and listing over a [`TaskStore`].
///
/// Every operation opens its own session: acquire and ping under the retry
/// policy, make sure the table exists, run one statement. The session is
/// released when the operation returns, whatever the outcome.
pub struct TaskService<S>
where
    S: TaskStore,
{
    store: Arc<S>,
    schema: Arc<SchemaInitializer>,
    retry: RetryPolicy,
}

impl<S> Clone for TaskService<S>
where
    S: TaskStore,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            schema: Arc::clone(&self.schema),
            retry: self.retry,
        }
    }
}

impl<S> TaskService<S>
where
    S: TaskStore,
{
    /// Creates a task service.
    #[must_use]
    pub fn new(store: Arc<S>, retry: RetryPolicy) -> Self {
        Self {
            store,
            schema: Arc::new(SchemaInitializer::new()),
            retry,
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the schema initializer shared by clones of this service.
    #[must_use]
    pub fn schema(&self) -> &SchemaInitializer {
        &self.schema
    }

    /// Returns all tasks, most recently created first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Connection`],
    /// [`TaskServiceError::SchemaInit`], or [`TaskServiceError::Store`]
    /// depending on which step failed.
    pub async fn list_tasks(&self) -> TaskServiceResult<Vec<Task>> {
        let mut session = self.open_session().await?;
        let tasks = session.list_tasks().await?;
        debug!(count = tasks.len(), "listed tasks");
        Ok(tasks)
    }

    /// Creates a task from the request.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Validation`] before touching the store
    /// when the description is absent or empty, otherwise the error of the
    /// failing store step.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskServiceResult<Task> {
        let new_task = request.into_new_task()?;
        let mut session = self.open_session().await?;
        let task = session.insert_task(&new_task).await?;
        info!(task_id = %task.id(), "task created");
        Ok(task)
    }

    async fn open_session(&self) -> TaskServiceResult<S::Session> {
        let store = &self.store;
        let mut session = self
            .retry
            .run("database connectivity check", |attempt| async move {
                debug!(attempt, "acquiring database session");
                let mut session = store.acquire().await?;
                session.ping().await?;
                Ok::<_, TaskStoreError>(session)
            })
            .await
            .map_err(TaskServiceError::Connection)?;

        self.schema
            .ensure(&mut session)
            .await
            .map_err(TaskServiceError::SchemaInit)?;
        Ok(session)
    }
}
