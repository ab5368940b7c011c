//! Error types for task domain validation.

use thiserror::Error;

/// Errors returned while constructing domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The description field was absent or not a string.
    #[error("description is required")]
    MissingDescription,

    /// The description is empty after trimming.
    #[error("description must not be empty")]
    EmptyDescription,
}
