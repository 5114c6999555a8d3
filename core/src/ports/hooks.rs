//! Execution hooks port (interface).

use crate::domain::CommandOutcome;

/// Callbacks the coordinator invokes around every task.
///
/// Both methods are called from concurrently running tasks, so implementations
/// synchronize any shared state themselves.
pub trait ExecutionHooks: Send + Sync {
    /// Per-task value returned by [`before`](Self::before) and handed back to
    /// [`after`](Self::after), e.g. a progress bar.
    type Handle: Send + 'static;

    /// Called right before `command` starts executing.
    fn before(&self, command: &str) -> Self::Handle;

    /// Called once the task finished, whether it succeeded, failed or timed out.
    fn after(&self, outcome: &CommandOutcome, handle: Self::Handle);
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl ExecutionHooks for NoopHooks {
    type Handle = ();

    fn before(&self, _command: &str) {}

    fn after(&self, _outcome: &CommandOutcome, _handle: ()) {}
}
