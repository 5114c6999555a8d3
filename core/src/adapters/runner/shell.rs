//! Shell-backed process runner.
//!
//! Commands arrive as fully built shell strings (`sudo nmap -sn ... -oX -`), so
//! they are handed to the platform shell rather than split into arguments here.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::domain::CommandOutcome;
use crate::error::Error;
use crate::ports::ProcessRunner;

/// Runs commands through `sh -c` (or `cmd /C` on Windows).
#[derive(Debug, Clone, Default)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }

    fn build(command: &str) -> Command {
        #[cfg(windows)]
        let mut cmd = {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        };

        #[cfg(not(windows))]
        let mut cmd = {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        };

        // Own process group, so a timeout can take down everything the
        // shell started.
        #[cfg(unix)]
        cmd.process_group(0);

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl ProcessRunner for ShellRunner {
    async fn run(&self, command: &str, timeout: Duration) -> CommandOutcome {
        debug!(command, "spawning");

        let child = match Self::build(command).spawn() {
            Ok(child) => child,
            Err(e) => {
                return CommandOutcome::spawn_failed(
                    command,
                    Error::CommandFailed(format!("Failed to run `{}`: {}", command, e)),
                )
            }
        };
        let pid = child.id();

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Err(_) => {
                kill_process_group(pid);
                CommandOutcome::timed_out(command, timeout)
            }
            Ok(Err(e)) => CommandOutcome::spawn_failed(
                command,
                Error::CommandFailed(format!("Failed to wait for `{}`: {}", command, e)),
            ),
            Ok(Ok(output)) => CommandOutcome::completed(
                command,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr),
                output.status.code(),
            ),
        }
    }
}

/// SIGKILL the group led by `pid`. Best effort: the group may already be
/// gone, or belong to root when the command went through sudo.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        debug!(pid, error = %e, "could not kill process group");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
