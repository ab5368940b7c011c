//! Step definitions for task API BDD scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
