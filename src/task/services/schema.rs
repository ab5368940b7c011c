//! Lazy creation of the `tasks` table.

use crate::task::ports::{TaskSession, TaskStoreError, TaskStoreResult};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Ensures the `tasks` table exists before the first query of a process.
///
/// The check is not guarded by a lock. Concurrent cold-start requests may
/// all try to create the table; losing that race is not an error.
#[derive(Debug, Default)]
pub struct SchemaInitializer {
    ready: AtomicBool,
}

impl SchemaInitializer {
    /// Creates an initializer that has not yet seen the table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
        }
    }

    /// Reports whether the table is known to exist.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Checks for the table over `session` and creates it when absent.
    ///
    /// Once the table is known to exist no further statements are issued.
    ///
    /// # Errors
    ///
    /// Returns the store error when the check or the creation fails and the
    /// table is still absent afterwards.
    pub async fn ensure<S>(&self, session: &mut S) -> TaskStoreResult<()>
    where
        S: TaskSession,
    {
        if self.is_ready() {
            return Ok(());
        }

        if session.table_exists().await? {
            debug!("tasks table already exists");
        } else {
            info!("tasks table does not exist, creating");
            match session.create_table().await {
                Ok(()) => info!("tasks table created"),
                Err(TaskStoreError::TableAlreadyExists) => {
                    info!("tasks table was created by a concurrent request");
                }
                Err(err) => {
                    if !matches!(session.table_exists().await, Ok(true)) {
                        return Err(err);
                    }
                    info!(error = %err, "tasks table appeared despite a failed creation");
                }
            }
        }

        self.ready.store(true, Ordering::Release);
        Ok(())
    }
}
