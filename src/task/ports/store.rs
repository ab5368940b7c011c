//! Store port for task persistence.
//!
//! A [`TaskStore`] hands out [`TaskSession`]s, each backed by one pooled
//! connection. Dropping a session returns its connection to the pool, so a
//! session acquired for a request is released exactly once on every exit
//! path, including unwinding.

use crate::task::domain::{NewTask, Task};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Source of connection-scoped task sessions.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Session type handed out by [`TaskStore::acquire`].
    type Session: TaskSession;

    /// Acquires a connection from the pool and wraps it in a session.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Connection`] when no connection can be
    /// obtained.
    async fn acquire(&self) -> TaskStoreResult<Self::Session>;
}

/// Statements executed over one acquired connection.
#[async_trait]
pub trait TaskSession: Send {
    /// Issues a trivial statement to confirm the connection is usable.
    async fn ping(&mut self) -> TaskStoreResult<()>;

    /// Reports whether the `tasks` table exists in the current schema.
    async fn table_exists(&mut self) -> TaskStoreResult<bool>;

    /// Creates the `tasks` table.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TableAlreadyExists`] when another session
    /// created the table first.
    async fn create_table(&mut self) -> TaskStoreResult<()>;

    /// Returns every task, most recently created first.
    ///
    /// Rows sharing a creation timestamp are ordered by descending
    /// identifier.
    async fn list_tasks(&mut self) -> TaskStoreResult<Vec<Task>>;

    /// Inserts a task and returns the stored row with its assigned
    /// identifier and creation timestamp.
    async fn insert_task(&mut self, task: &NewTask) -> TaskStoreResult<Task>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// The store could not be reached or the connection was lost.
    #[error("connection error: {0}")]
    Connection(Arc<dyn std::error::Error + Send + Sync>),

    /// The `tasks` table was created concurrently by another session.
    #[error("tasks table already exists")]
    TableAlreadyExists,

    /// A statement violated a table constraint.
    #[error("constraint violation: {0}")]
    Constraint(Arc<dyn std::error::Error + Send + Sync>),

    /// Any other persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a connectivity error.
    pub fn connection(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Connection(Arc::new(err))
    }

    /// Wraps a constraint violation.
    pub fn constraint(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Constraint(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Machine-readable code surfaced to API callers.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "DB_CONNECTION_ERROR",
            Self::TableAlreadyExists => "DB_TABLE_EXISTS",
            Self::Constraint(_) => "DB_CONSTRAINT_ERROR",
            Self::Persistence(_) => "DB_ERROR",
        }
    }
}
