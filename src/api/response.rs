//! Response envelope and CORS headers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Media type of every response body.
pub const CONTENT_TYPE_JSON: &str = "application/json";

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ALLOWED_HEADERS: &str = concat!(
    "Content-Type, Authorization, X-Amz-Date, X-Api-Key, ",
    "X-Amz-Security-Token, X-Requested-With",
);

/// Cross-origin headers attached to every response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    allowed_origin: String,
}

impl CorsPolicy {
    /// Creates a policy admitting `allowed_origin` (`*` for any origin).
    #[must_use]
    pub fn new(allowed_origin: impl Into<String>) -> Self {
        Self {
            allowed_origin: allowed_origin.into(),
        }
    }

    /// Returns the admitted origin.
    #[must_use]
    pub fn allowed_origin(&self) -> &str {
        &self.allowed_origin
    }

    /// Returns the headers for a response, `Content-Type` included.
    ///
    /// Credentials are only advertised for a specific origin, since browsers
    /// reject them alongside a wildcard.
    #[must_use]
    pub fn headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::from([
            (
                "Access-Control-Allow-Origin".to_owned(),
                self.allowed_origin.clone(),
            ),
            (
                "Access-Control-Allow-Methods".to_owned(),
                ALLOWED_METHODS.to_owned(),
            ),
            (
                "Access-Control-Allow-Headers".to_owned(),
                ALLOWED_HEADERS.to_owned(),
            ),
            ("Access-Control-Expose-Headers".to_owned(), "*".to_owned()),
            ("Content-Type".to_owned(), CONTENT_TYPE_JSON.to_owned()),
        ]);
        if self.allowed_origin != "*" {
            headers.insert(
                "Access-Control-Allow-Credentials".to_owned(),
                "true".to_owned(),
            );
        }
        headers
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::new("*")
    }
}

/// Runtime-neutral HTTP response.
///
/// Serializes in the shape API Gateway expects from a function:
/// `{"statusCode", "headers", "body"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse {
    /// HTTP status code.
    #[serde(rename = "statusCode")]
    pub status: u16,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Serialized JSON body; empty for preflight responses.
    pub body: String,
}

impl ApiResponse {
    /// Builds a JSON response.
    ///
    /// # Errors
    ///
    /// Returns the serialization error when `payload` cannot be encoded.
    pub fn json<T>(status: u16, payload: &T, cors: &CorsPolicy) -> serde_json::Result<Self>
    where
        T: Serialize + ?Sized,
    {
        Ok(Self {
            status,
            headers: cors.headers(),
            body: serde_json::to_string(payload)?,
        })
    }

    /// Builds a response with an empty body.
    #[must_use]
    pub fn empty(status: u16, cors: &CorsPolicy) -> Self {
        Self {
            status,
            headers: cors.headers(),
            body: String::new(),
        }
    }

    /// Looks up a header, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Short human-readable title.
    pub error: String,
    /// Human-readable description of what went wrong.
    pub message: String,
    /// Machine-readable error code.
    pub code: String,
    /// Identifier of the failed request.
    pub request_id: String,
    /// RFC 3339 time at which the error response was built.
    pub timestamp: String,
    /// Optional structured context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorEnvelope {
    /// Formats a timestamp the way envelopes carry it.
    #[must_use]
    pub fn format_timestamp(at: DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
