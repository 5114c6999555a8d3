//! Check command - verify that nmap can be run.

use anyhow::Result;
use whoshome_core::{ConcurrentScanCoordinator, ProcessRunner};

use crate::nmap;
use crate::output;

pub async fn run<R: ProcessRunner + 'static>(
    coordinator: &ConcurrentScanCoordinator<R>,
    sudo: bool,
) -> Result<()> {
    let outcome = coordinator.run_one(nmap::version_command(sudo)).await?;
    println!("{}", output::version_report(&outcome));
    if !outcome.succeeded() {
        anyhow::bail!("nmap is not available");
    }
    Ok(())
}
