//! Application services for task creation and listing.

mod retry;
mod schema;
mod tasks;

pub use retry::RetryPolicy;
pub use schema::SchemaInitializer;
pub use tasks::{CreateTaskRequest, TaskService, TaskServiceError, TaskServiceResult};
