//! Side-channel error reporting.
//!
//! [`Diagnostics`] turns a handled [`ApiError`] into an [`ErrorReport`] and
//! hands it to an [`ErrorSink`]. Reporting never fails and never changes the
//! response.

use super::error::ApiError;
use crate::task::ports::{ErrorReport, ErrorSink};
use serde_json::{Map, Value};
use std::error::Error as _;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::warn;

/// Placeholder written over secret values.
pub const REDACTED: &str = "[REDACTED]";

/// Key fragments marking a value as secret, matched case-insensitively.
const SECRET_KEY_FRAGMENTS: [&str; 5] = ["password", "token", "secret", "authorization", "api_key"];

/// Request context attached to a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContext<'a> {
    /// Identifier of the failed request.
    pub request_id: &'a str,
    /// `METHOD path` of the request.
    pub route: &'a str,
    /// Request parameters, before redaction.
    pub params: &'a Value,
}

/// Forwards handled errors to an [`ErrorSink`].
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<dyn ErrorSink>,
}

impl Diagnostics {
    /// Creates a wrapper around `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn ErrorSink>) -> Self {
        Self { sink }
    }

    /// Reports `error` with redacted request context.
    ///
    /// A panicking sink is contained and logged.
    pub fn report(&self, error: &ApiError, context: &ReportContext<'_>) {
        let report = ErrorReport {
            code: error.code().to_owned(),
            status: error.status(),
            message: error_chain(error),
            request_id: context.request_id.to_owned(),
            route: context.route.to_owned(),
            params: redact(context.params),
        };
        let sink = &self.sink;
        if catch_unwind(AssertUnwindSafe(|| sink.capture(&report))).is_err() {
            warn!(request_id = %report.request_id, "error sink panicked while capturing a report");
        }
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}

/// Returns a copy of `value` with secret fields replaced by [`REDACTED`].
///
/// Objects are walked recursively, including objects inside arrays.
#[must_use]
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, field)| {
                    let cleaned = if is_secret_key(key) {
                        Value::String(REDACTED.to_owned())
                    } else {
                        redact(field)
                    };
                    (key.clone(), cleaned)
                })
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

fn is_secret_key(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    SECRET_KEY_FRAGMENTS
        .iter()
        .any(|fragment| lowered.contains(fragment))
}

fn error_chain(error: &ApiError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
