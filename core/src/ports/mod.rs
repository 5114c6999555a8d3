//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with external systems. Implementations live in `adapters`.

mod hooks;
mod runner;

pub use hooks::{ExecutionHooks, NoopHooks};
pub use runner::ProcessRunner;
