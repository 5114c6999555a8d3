//! Process runner adapters.

mod shell;

pub use shell::ShellRunner;
