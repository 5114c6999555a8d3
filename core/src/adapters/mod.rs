//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter handles communication with external systems.

pub mod privileges;
pub mod runner;

// Re-export main types for convenience
pub use privileges::{requires_elevation, running_as_root};
pub use runner::ShellRunner;
