//! `PostgreSQL` adapter for task persistence.

mod events;
mod models;
mod schema;
mod store;

pub use events::{PoolErrorLogger, PoolEventLogger};
pub use store::{CREATE_TASKS_TABLE_SQL, PostgresTaskSession, PostgresTaskStore, TaskPgPool};
