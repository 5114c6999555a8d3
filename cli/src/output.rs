//! Terminal rendering of scan results.

use crossterm::style::Stylize;
use whoshome_core::{
    count_unique_devices, CommandOutcome, Device, Error, ScanResultView, UNKNOWN,
};

/// One line per discovered device.
pub fn device_line(device: &Device) -> String {
    format!(
        " {} {} {} {} {} {}",
        "Found ip address:".magenta(),
        device.ip_address.as_str().cyan().bold(),
        "mac address:".magenta(),
        device.mac_address.as_deref().unwrap_or(UNKNOWN).cyan().bold(),
        "for hostname:".magenta(),
        device.display_hostname().cyan().bold(),
    )
}

/// Host totals exactly as the report states them.
pub fn host_totals(view: &ScanResultView) -> String {
    format!(
        " {} {} {} {} {}",
        "found".magenta(),
        view.total_hosts_up().to_string().cyan().bold(),
        "hosts up after scanning a total of".magenta(),
        view.total_hosts_scanned().cyan().bold(),
        "hosts".magenta(),
    )
}

pub fn unique_devices(devices: &[Device]) -> String {
    format!(
        " {} {} {}",
        "Found".magenta(),
        count_unique_devices(devices).to_string().cyan().bold(),
        "unique devices".magenta(),
    )
}

/// Discovery summary: device lines followed by the report totals.
pub fn discovery_report(view: &ScanResultView) -> String {
    let mut lines: Vec<String> = view.devices().iter().map(device_line).collect();
    lines.push(host_totals(view));
    lines.join("\n")
}

/// Open ports and OS guess for one scanned device.
pub fn port_report(device: &Device) -> String {
    let mut lines = vec![format!(
        " {} {} ({})",
        "Ports on".magenta(),
        device.ip_address.as_str().cyan().bold(),
        device.display_hostname(),
    )];

    if let Some(os) = &device.operating_system {
        lines.push(format!("   {} {}", "os:".magenta(), os));
    }

    if device.ports().is_empty() {
        lines.push(format!("   {}", "no open ports".dim()));
    }
    for port in device.ports() {
        lines.push(format!(
            "   {:<10} {:<14} {:<24} {}",
            port.display_port(),
            port.service.name,
            port.service.product,
            port.service.protocol_type,
        ));
    }

    lines.join("\n")
}

/// Render a finished port scan, or why it could not be read.
pub fn port_scan_outcome(outcome: &CommandOutcome) -> String {
    if !outcome.succeeded() {
        return failure(outcome);
    }
    match ScanResultView::from_outcome(outcome) {
        Ok(view) if view.devices().is_empty() => format!(
            " {} {}",
            "No host answered".yellow(),
            outcome.command().dim()
        ),
        Ok(view) => view
            .devices()
            .iter()
            .map(port_report)
            .collect::<Vec<_>>()
            .join("\n"),
        Err(e) => parse_failure(outcome, &e),
    }
}

pub fn failure(outcome: &CommandOutcome) -> String {
    format!(" {} {}", "✗".red().bold(), outcome.to_string().red())
}

pub fn parse_failure(outcome: &CommandOutcome, error: &Error) -> String {
    format!(
        " {} {} {}",
        "✗".red().bold(),
        format!("Could not read the report of `{}`:", outcome.command()).red(),
        error,
    )
}

/// Result of `nmap --version`.
pub fn version_report(outcome: &CommandOutcome) -> String {
    if outcome.succeeded() {
        let version = outcome.stdout().lines().next().unwrap_or_default();
        format!(" {} {}", "✓ nmap is installed:".green().bold(), version)
    } else {
        format!(
            " {} {}",
            "✗ nmap could not be run:".red().bold(),
            outcome.to_string().red()
        )
    }
}
