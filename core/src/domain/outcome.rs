//! Result of one external command execution.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a command execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutcomeKind {
    /// The process exited with status 0.
    Succeeded,
    /// The process exited non-zero, was killed by a signal, or never started.
    Failed,
    /// The process did not finish within the configured timeout.
    TimedOut,
}

/// Immutable record of a single command execution.
///
/// Created once per process execution and never mutated afterwards, so all
/// fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    command: String,
    stdout: String,
    stderr: String,
    exit_code: i32,
    succeeded: bool,
    kind: OutcomeKind,
}

/// Exit code recorded when the process produced no code of its own.
pub const NO_EXIT_CODE: i32 = -1;

impl CommandOutcome {
    /// Outcome of a process that ran to completion.
    ///
    /// `exit_code` is `None` when the process was terminated by a signal.
    pub fn completed(
        command: impl Into<String>,
        stdout: impl AsRef<str>,
        stderr: impl AsRef<str>,
        exit_code: Option<i32>,
    ) -> Self {
        let kind = match exit_code {
            Some(0) => OutcomeKind::Succeeded,
            _ => OutcomeKind::Failed,
        };
        Self {
            command: command.into(),
            stdout: stdout.as_ref().trim().to_string(),
            stderr: stderr.as_ref().trim().to_string(),
            exit_code: exit_code.unwrap_or(NO_EXIT_CODE),
            succeeded: kind == OutcomeKind::Succeeded,
            kind,
        }
    }

    /// Outcome of a process that exceeded its time budget.
    pub fn timed_out(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            stdout: String::new(),
            stderr: format!("timed out after {}s", timeout.as_secs_f64()),
            exit_code: NO_EXIT_CODE,
            succeeded: false,
            kind: OutcomeKind::TimedOut,
        }
    }

    /// Outcome of a process that could not be started at all.
    pub fn spawn_failed(command: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            command: command.into(),
            stdout: String::new(),
            stderr: reason.to_string(),
            exit_code: NO_EXIT_CODE,
            succeeded: false,
            kind: OutcomeKind::Failed,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn kind(&self) -> OutcomeKind {
        self.kind
    }

    /// Whether this outcome was classified as a timeout.
    pub fn is_timeout(&self) -> bool {
        self.kind == OutcomeKind::TimedOut
    }
}

impl std::fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            OutcomeKind::Succeeded => write!(f, "`{}` succeeded", self.command),
            OutcomeKind::Failed => write!(
                f,
                "`{}` failed (exit code {}): {}",
                self.command, self.exit_code, self.stderr
            ),
            OutcomeKind::TimedOut => write!(f, "`{}` {}", self.command, self.stderr),
        }
    }
}
