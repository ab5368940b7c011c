//! Diagnostics port for side-channel error reporting.

use serde::Serialize;
use serde_json::Value;

/// Error details forwarded to an external reporting sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    /// Machine-readable error code, as returned to the caller.
    pub code: String,
    /// HTTP status of the response built for the error.
    pub status: u16,
    /// Error message including its source chain.
    pub message: String,
    /// Identifier of the request that failed.
    pub request_id: String,
    /// `METHOD path` of the request, or `unknown` when it was malformed.
    pub route: String,
    /// Request parameters with secret values redacted.
    pub params: Value,
}

/// Receives error reports.
///
/// Implementations must not fail: reporting never changes the response that
/// has already been built for the caller.
#[cfg_attr(test, mockall::automock)]
pub trait ErrorSink: Send + Sync {
    /// Records one error report.
    fn capture(&self, report: &ErrorReport);
}
