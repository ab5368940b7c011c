//! Port contracts for task storage and diagnostics.
//!
//! Ports define infrastructure-agnostic interfaces used by task services and
//! the request-handling core.

pub mod diagnostics;
pub mod store;

pub use diagnostics::{ErrorReport, ErrorSink};
pub use store::{TaskSession, TaskStore, TaskStoreError, TaskStoreResult};

#[cfg(test)]
pub use diagnostics::MockErrorSink;
