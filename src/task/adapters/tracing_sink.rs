//! Error sink that emits reports as `tracing` events.

use crate::config::DiagnosticsConfig;
use crate::task::ports::{ErrorReport, ErrorSink};
use tracing::error;

/// Writes each [`ErrorReport`] as one structured error event on the
/// `taskboard::diagnostics` target.
///
/// A configured DSN is reduced to its host so that embedded keys never reach
/// the logs.
#[derive(Debug, Clone)]
pub struct TracingErrorSink {
    environment: String,
    target: String,
}

impl TracingErrorSink {
    /// Creates a sink tagged with the deployment environment.
    #[must_use]
    pub fn new(config: &DiagnosticsConfig) -> Self {
        Self {
            environment: config.environment().to_owned(),
            target: config.dsn().map_or_else(|| "local".to_owned(), dsn_host),
        }
    }

    /// Returns the collector host reports are tagged with, or `local`.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl ErrorSink for TracingErrorSink {
    fn capture(&self, report: &ErrorReport) {
        error!(
            target: "taskboard::diagnostics",
            environment = %self.environment,
            sink = %self.target,
            code = %report.code,
            status = report.status,
            request_id = %report.request_id,
            route = %report.route,
            params = %report.params,
            "{}",
            report.message
        );
    }
}

fn dsn_host(dsn: &str) -> String {
    let without_scheme = dsn.split_once("://").map_or(dsn, |(_, rest)| rest);
    let without_credentials = without_scheme
        .rsplit_once('@')
        .map_or(without_scheme, |(_, host)| host);
    without_credentials
        .split(['/', '?'])
        .next()
        .unwrap_or_default()
        .to_owned()
}
