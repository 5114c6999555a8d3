//! Error types for the whoshome-core library.

use thiserror::Error;

/// Result type alias for whoshome operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that escape the core.
///
/// Per-task process failures and timeouts are never represented here: they are
/// recorded on the task's [`CommandOutcome`](crate::domain::CommandOutcome).
#[derive(Error, Debug)]
pub enum Error {
    /// The scan report is not well-formed XML.
    #[error("Malformed scan report: {0}")]
    Parse(#[from] roxmltree::Error),

    /// Well-formed XML that is not a scan report.
    #[error("Unexpected scan document: {0}")]
    UnexpectedDocument(String),

    /// A batch was submitted with no commands.
    #[error("Cannot run an empty command batch")]
    EmptyBatch,

    /// Coordinator or scheduler settings are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to spawn a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
