//! Request-handling core shared by every deployment shape.
//!
//! A request flows through [`request::validate`], is routed by
//! [`handler::TaskApi`], runs against the task service, and leaves as an
//! [`response::ApiResponse`]. Errors are mapped to a uniform envelope at the
//! handler boundary and reported through [`diagnostics::Diagnostics`].

pub mod diagnostics;
pub mod error;
pub mod handler;
pub mod request;
pub mod response;

pub use diagnostics::Diagnostics;
pub use error::ApiError;
pub use handler::{HEALTH_PATH, TASKS_PATH, TaskApi};
pub use request::{ApiGatewayEvent, MalformedRequest, Method, RawRequest, ValidatedRequest};
pub use response::{ApiResponse, CorsPolicy};
