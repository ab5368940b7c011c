//! In-memory task store for tests and local experiments.

mod store;

pub use store::{InMemorySession, InMemoryTaskStore, StoreProbe};
