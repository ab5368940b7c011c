//! Taskboard: a small task-tracking API.
//!
//! Tasks are created and listed through one request-handling core that is
//! shared by two deployment shapes: a function-style entry point driven by
//! API Gateway events and a conventional local HTTP server.
//!
//! # Architecture
//!
//! Taskboard follows hexagonal architecture principles:
//!
//! - **Domain**: task values and their validation rules
//! - **Ports**: store and diagnostics traits
//! - **Adapters**: `PostgreSQL`, in-memory, and `tracing`-backed implementations
//!
//! # Modules
//!
//! - [`task`]: domain, ports, adapters, and the task service
//! - [`api`]: request validation, routing, and response shaping
//! - [`http`]: the local server and Lambda adapters
//! - [`config`]: environment-driven configuration
//! - [`telemetry`]: `tracing` subscriber installation

pub mod api;
pub mod app;
pub mod config;
pub mod http;
pub mod task;
pub mod telemetry;
