//! whoshome Core Library
//!
//! Discovers devices on the local network by running nmap and reading its XML
//! reports. Provides functionality to:
//! - Run batches of scan commands concurrently with a bounded worker pool
//! - Normalize nmap XML reports whose shape varies between runs
//! - Query devices, ports and OS guesses from a normalized report
//! - Manage user configuration (timeouts, worker count)
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services
//! - `parser` / `view`: Report normalization and queries

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod error;
pub mod parser;
pub mod view;

// Re-export domain types (primary API)
pub use domain::{
    count_unique_devices, CommandOutcome, Device, OperatingSystem, OutcomeKind, Port, Service,
    UNKNOWN,
};

// Re-export other commonly used types
pub use adapters::ShellRunner;
pub use application::{Advisory, ConcurrentScanCoordinator, CoordinatorOptions};
pub use config::{Config, ConfigStore};
pub use error::{Error, Result};
pub use parser::{ScanDocument, ScanDocumentNormalizer};
pub use ports::{ExecutionHooks, NoopHooks, ProcessRunner};
pub use view::ScanResultView;
