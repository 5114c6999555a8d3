//! Privilege detection.

/// Token that marks a command as needing elevated privileges.
pub const ELEVATION_MARKER: &str = "sudo";

/// Whether the current process runs with root privileges.
#[cfg(unix)]
pub fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Whether the current process runs with root privileges.
#[cfg(not(unix))]
pub fn running_as_root() -> bool {
    false
}

/// Whether `command` asks for elevated privileges.
pub fn requires_elevation(command: &str) -> bool {
    command.split_whitespace().next() == Some(ELEVATION_MARKER)
}
