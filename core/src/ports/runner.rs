//! Process runner port (interface).

use std::time::Duration;

use crate::domain::CommandOutcome;

/// Port for executing one external command.
///
/// Implementations never fail: spawn errors, non-zero exits and timeouts are
/// all recorded on the returned [`CommandOutcome`].
pub trait ProcessRunner: Send + Sync {
    /// Run `command` and wait at most `timeout` for it to finish.
    fn run(
        &self,
        command: &str,
        timeout: Duration,
    ) -> impl std::future::Future<Output = CommandOutcome> + Send;
}
