//! Error taxonomy of the request-handling core.

use super::request::MalformedRequest;
use crate::task::{
    domain::TaskDomainError,
    ports::TaskStoreError,
    services::TaskServiceError,
};
use serde_json::{Value, json};
use thiserror::Error;

/// Every failure the handler can turn into a response.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request was structurally invalid.
    #[error(transparent)]
    Malformed(#[from] MalformedRequest),

    /// The body was not valid JSON.
    #[error("{0}")]
    InvalidJson(String),

    /// A required field was absent or empty.
    #[error(transparent)]
    MissingFields(TaskDomainError),

    /// No route exists for the path.
    #[error("Path {path} does not exist")]
    RouteNotFound {
        /// Requested path.
        path: String,
        /// Paths the API serves.
        available: Vec<&'static str>,
    },

    /// The path exists but does not accept the method.
    #[error("Method {method} is not allowed for this endpoint")]
    MethodNotAllowed {
        /// Requested method.
        method: String,
        /// Requested path.
        path: String,
        /// Methods the path accepts.
        allowed: Vec<&'static str>,
    },

    /// The database could not be reached.
    #[error("{0}")]
    DatabaseConnection(TaskStoreError),

    /// The `tasks` table could not be checked or created.
    #[error("{0}")]
    DatabaseInit(TaskStoreError),

    /// A query failed.
    #[error("{0}")]
    Database(TaskStoreError),

    /// Anything else, including panics caught at the handler boundary.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status code for the error.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Malformed(MalformedRequest::MissingPath) | Self::RouteNotFound { .. } => 404,
            Self::Malformed(_) | Self::InvalidJson(_) | Self::MissingFields(_) => 400,
            Self::MethodNotAllowed { .. } => 405,
            Self::DatabaseConnection(_)
            | Self::DatabaseInit(_)
            | Self::Database(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "MALFORMED_REQUEST",
            Self::InvalidJson(_) => "INVALID_JSON",
            Self::MissingFields(_) => "MISSING_FIELDS",
            Self::RouteNotFound { .. } => "ROUTE_NOT_FOUND",
            Self::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            Self::DatabaseConnection(_) => "DB_CONNECTION_ERROR",
            Self::DatabaseInit(_) => "DB_INIT_ERROR",
            Self::Database(err) => err.code(),
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Short human-readable title.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "Malformed request",
            Self::InvalidJson(_) => "Invalid JSON in request body",
            Self::MissingFields(_) => "Missing required fields",
            Self::RouteNotFound { .. } => "Route not found",
            Self::MethodNotAllowed { .. } => "Method not allowed",
            Self::DatabaseConnection(_) => "Database connection failed",
            Self::DatabaseInit(_) => "Database initialization failed",
            Self::Database(_) => "Database error",
            Self::Internal(_) => "Internal server error",
        }
    }

    /// Structured context returned alongside the error, if any.
    #[must_use]
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::MissingFields(_) => Some(json!({ "required": ["description"] })),
            Self::RouteNotFound { path, available } => Some(json!({
                "path": path,
                "availableRoutes": available,
            })),
            Self::MethodNotAllowed {
                method,
                path,
                allowed,
            } => Some(json!({
                "method": method,
                "path": path,
                "allowedMethods": allowed,
            })),
            _ => None,
        }
    }

    /// Reports whether the error is the server's fault.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status() >= 500
    }
}

impl From<TaskServiceError> for ApiError {
    fn from(err: TaskServiceError) -> Self {
        match err {
            TaskServiceError::Validation(inner) => Self::MissingFields(inner),
            TaskServiceError::Connection(inner) => Self::DatabaseConnection(inner),
            TaskServiceError::SchemaInit(inner) => Self::DatabaseInit(inner),
            TaskServiceError::Store(inner) => Self::Database(inner),
        }
    }
}
