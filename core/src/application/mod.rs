//! Application layer - Use case services.
//!
//! Services are designed to be thin orchestrators that:
//! - Accept domain types as inputs
//! - Use ports (traits) for external dependencies
//! - Return domain types as outputs

mod coordinator;

pub use coordinator::{
    Advisory, ConcurrentScanCoordinator, CoordinatorOptions, DEFAULT_MAX_WORKERS, DEFAULT_TIMEOUT,
};
