//! Deployment adapters around the request-handling core.
//!
//! Both adapters only translate between their runtime's request type and
//! [`crate::api::RawRequest`], and back from [`crate::api::ApiResponse`].

pub mod lambda;
pub mod server;
