//! Domain layer - Pure data models.
//!
//! This module contains domain entities that represent core business concepts.
//! These types have no I/O dependencies and can be tested in isolation.

mod device;
mod outcome;

// Re-export all domain types
pub use device::{
    count_unique_devices, or_unknown, Device, OperatingSystem, Port, Service, UNKNOWN,
};
pub use outcome::{CommandOutcome, OutcomeKind, NO_EXIT_CODE};
