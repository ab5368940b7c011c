//! Inbound request normalization.
//!
//! Deployment adapters turn whatever their runtime hands them into a
//! [`RawRequest`]; [`validate`] turns that into a [`ValidatedRequest`] or a
//! [`MalformedRequest`]. Bodies pass through unparsed.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// HTTP method of an inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `OPTIONS`
    Options,
    /// Any other method token, upper-cased.
    Other(String),
}

impl Method {
    /// Parses a method token, case-insensitively.
    ///
    /// Returns `None` for blank tokens or tokens containing whitespace.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let trimmed = token.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return None;
        }
        let upper = trimmed.to_ascii_uppercase();
        Some(match upper.as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "OPTIONS" => Self::Options,
            _ => Self::Other(upper),
        })
    }

    /// Returns the canonical method token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Options => "OPTIONS",
            Self::Other(token) => token,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural problems with an inbound request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedRequest {
    /// No HTTP method was supplied.
    #[error("missing HTTP method in request")]
    MissingMethod,

    /// The HTTP method is not a valid token.
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    /// No path was supplied.
    #[error("missing path in request")]
    MissingPath,

    /// The runtime event could not be read at all.
    #[error("unreadable request event: {0}")]
    InvalidEvent(String),

    /// The event body is base64-encoded, which this API does not accept.
    #[error("base64-encoded request bodies are not supported")]
    EncodedBody,
}

/// Request as received from a runtime, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRequest {
    /// Method token, if the runtime supplied one.
    pub method: Option<String>,
    /// Request path, if the runtime supplied one.
    pub path: Option<String>,
    /// Unparsed body bytes.
    pub body: Option<Vec<u8>>,
}

impl RawRequest {
    /// Creates a raw request with a method and path and no body.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            path: Some(path.into()),
            body: None,
        }
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns `METHOD path` for logs and reports, using `-` for absent
    /// parts.
    #[must_use]
    pub fn route_label(&self) -> String {
        format!(
            "{} {}",
            self.method.as_deref().unwrap_or("-"),
            self.path.as_deref().unwrap_or("-")
        )
    }
}

/// Request that passed structural validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    method: Method,
    path: String,
    body: Option<Vec<u8>>,
}

impl ValidatedRequest {
    /// Returns the method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the normalized path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the unparsed body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Validates a raw request.
///
/// Paths lose any query string and a single trailing slash (except for `/`).
///
/// # Errors
///
/// Returns [`MalformedRequest`] when the method or path is absent or blank,
/// or the method is not a valid token.
pub fn validate(raw: RawRequest) -> Result<ValidatedRequest, MalformedRequest> {
    let RawRequest { method, path, body } = raw;

    let method_token = method
        .filter(|token| !token.trim().is_empty())
        .ok_or(MalformedRequest::MissingMethod)?;
    let method =
        Method::parse(&method_token).ok_or(MalformedRequest::InvalidMethod(method_token))?;

    let path = path
        .as_deref()
        .map(normalize_path)
        .filter(|normalized| !normalized.is_empty())
        .ok_or(MalformedRequest::MissingPath)?;

    Ok(ValidatedRequest { method, path, body })
}

fn normalize_path(raw: &str) -> String {
    let without_query = raw.split(['?', '#']).next().unwrap_or_default().trim();
    if without_query.len() > 1 {
        without_query
            .strip_suffix('/')
            .unwrap_or(without_query)
            .to_owned()
    } else {
        without_query.to_owned()
    }
}

/// API Gateway HTTP API (payload format 2.0) event.
///
/// Only the fields the API needs are read; every one of them may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayEvent {
    /// Request context carrying the HTTP method.
    #[serde(default)]
    pub request_context: Option<EventRequestContext>,
    /// Request path without the query string.
    #[serde(default)]
    pub raw_path: Option<String>,
    /// Request body.
    #[serde(default)]
    pub body: Option<String>,
    /// Whether `body` is base64-encoded.
    #[serde(default)]
    pub is_base64_encoded: bool,
}

/// `requestContext` of an [`ApiGatewayEvent`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventRequestContext {
    /// HTTP details.
    #[serde(default)]
    pub http: Option<EventHttpContext>,
}

/// `requestContext.http` of an [`ApiGatewayEvent`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventHttpContext {
    /// HTTP method.
    #[serde(default)]
    pub method: Option<String>,
    /// Request path; used when `rawPath` is absent.
    #[serde(default)]
    pub path: Option<String>,
}

impl ApiGatewayEvent {
    /// Reads an event from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedRequest::InvalidEvent`] when the value does not have
    /// the shape of an event (for example, it is not an object).
    pub fn from_value(value: Value) -> Result<Self, MalformedRequest> {
        serde_json::from_value(value).map_err(|err| MalformedRequest::InvalidEvent(err.to_string()))
    }

    /// Converts the event into a [`RawRequest`].
    ///
    /// # Errors
    ///
    /// Returns [`MalformedRequest::EncodedBody`] for base64-encoded bodies.
    pub fn into_raw_request(self) -> Result<RawRequest, MalformedRequest> {
        if self.is_base64_encoded && self.body.is_some() {
            return Err(MalformedRequest::EncodedBody);
        }
        let http = self.request_context.and_then(|context| context.http);
        let (method, context_path) = http.map_or((None, None), |http| (http.method, http.path));
        Ok(RawRequest {
            method,
            path: self.raw_path.or(context_path),
            body: self.body.map(String::into_bytes),
        })
    }
}
