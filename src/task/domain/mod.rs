//! Domain model for tasks.
//!
//! A task is created once from a description and is read-only afterwards.
//! Identifiers and creation timestamps are assigned by the store.

mod error;
mod ids;
mod task;

pub use error::TaskDomainError;
pub use ids::TaskId;
pub use task::{Description, NewTask, PersistedTaskData, Task};
