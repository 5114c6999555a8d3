//! Scan command - discover devices, then optionally scan their ports.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use indicatif::MultiProgress;
use serde::Serialize;
use tracing::{debug, info};
use whoshome_core::{
    count_unique_devices, CommandOutcome, ConcurrentScanCoordinator, Device, ProcessRunner,
    ScanResultView, UNKNOWN,
};

use crate::nmap::{self, PingMode, PortScanKind};
use crate::output;
use crate::progress::ProgressHooks;

/// Everything one scan run needs, resolved from arguments and config.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub hosts: Vec<String>,
    pub cidr: String,
    pub ping: PingMode,
    pub sudo: bool,
    pub privileged: bool,
    pub port_scans: Vec<PortScanKind>,
    pub json: bool,
    pub progress: MultiProgress,
}

/// Report totals of one discovery command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NetworkSummary {
    command: String,
    hosts_up: u64,
    hosts_scanned: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport {
    networks: Vec<NetworkSummary>,
    unique_devices: usize,
    devices: Vec<Device>,
    port_scans: Vec<Device>,
    errors: Vec<String>,
    advisories: Vec<String>,
}

pub async fn run<R: ProcessRunner + 'static>(
    coordinator: &ConcurrentScanCoordinator<R>,
    settings: &ScanSettings,
) -> Result<()> {
    let mut report = JsonReport::default();

    let devices = discover(coordinator, settings, &mut report).await?;

    for kind in &settings.port_scans {
        scan_ports(coordinator, settings, *kind, &devices, &mut report).await?;
    }

    // Advisories were already logged as they were raised.
    report.advisories = coordinator
        .take_advisories()
        .iter()
        .map(ToString::to_string)
        .collect();

    if settings.json {
        report.unique_devices = count_unique_devices(&devices);
        report.devices = devices;
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

async fn discover<R: ProcessRunner + 'static>(
    coordinator: &ConcurrentScanCoordinator<R>,
    settings: &ScanSettings,
    report: &mut JsonReport,
) -> Result<Vec<Device>> {
    let commands: Vec<String> = settings
        .hosts
        .iter()
        .map(|host| nmap::discovery_command(host, &settings.cidr, settings.ping, settings.sudo))
        .collect();
    info!(networks = commands.len(), ping = ?settings.ping, "starting discovery");

    // Discovery output is printed once every network has answered.
    let hooks = Arc::new(ProgressHooks::new(
        settings.progress.clone(),
        |_: &CommandOutcome| -> Option<String> { None },
    ));
    let outcomes = coordinator.run_batch(commands, hooks).await?;

    let mut devices = Vec::new();
    for outcome in &outcomes {
        if !outcome.succeeded() {
            emit(settings, report, output::failure(outcome), outcome.to_string());
            continue;
        }

        let view = match ScanResultView::from_outcome(outcome) {
            Ok(view) => view,
            Err(e) => {
                let message = format!("{}: {}", outcome.command(), e);
                emit(settings, report, output::parse_failure(outcome, &e), message);
                continue;
            }
        };

        debug!(command = outcome.command(), hosts = view.host_count(), "report parsed");
        if settings.json {
            report.networks.push(NetworkSummary {
                command: outcome.command().to_string(),
                hosts_up: view.total_hosts_up(),
                hosts_scanned: view.total_hosts_scanned(),
            });
        } else {
            println!("{}", output::discovery_report(&view));
        }
        devices.extend(view.devices().iter().cloned());
    }

    if !settings.json && settings.hosts.len() > 1 {
        println!("{}", output::unique_devices(&devices));
    }
    Ok(devices)
}

async fn scan_ports<R: ProcessRunner + 'static>(
    coordinator: &ConcurrentScanCoordinator<R>,
    settings: &ScanSettings,
    kind: PortScanKind,
    devices: &[Device],
    report: &mut JsonReport,
) -> Result<()> {
    let targets = scan_targets(devices);
    if targets.is_empty() {
        info!(?kind, "no devices to port scan");
        return Ok(());
    }

    let commands: Vec<String> = targets
        .iter()
        .map(|ip| nmap::port_scan_command(ip, kind, settings.privileged, settings.sudo))
        .collect();
    info!(?kind, devices = commands.len(), "starting port scan");

    // Text output is printed by the hooks as each device finishes.
    let json = settings.json;
    let hooks = Arc::new(ProgressHooks::new(settings.progress.clone(), move |outcome: &CommandOutcome| {
        (!json).then(|| output::port_scan_outcome(outcome))
    }));
    let outcomes = coordinator.run_batch(commands, hooks).await?;

    if json {
        for outcome in &outcomes {
            if !outcome.succeeded() {
                report.errors.push(outcome.to_string());
                continue;
            }
            match ScanResultView::from_outcome(outcome) {
                Ok(view) => report.port_scans.extend(view.devices().iter().cloned()),
                Err(e) => report.errors.push(format!("{}: {}", outcome.command(), e)),
            }
        }
    }
    Ok(())
}

/// Distinct, known device addresses in a stable order.
fn scan_targets(devices: &[Device]) -> Vec<String> {
    devices
        .iter()
        .map(|d| d.ip_address.as_str())
        .filter(|ip| *ip != UNKNOWN)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn emit(settings: &ScanSettings, report: &mut JsonReport, text: String, message: String) {
    if settings.json {
        report.errors.push(message);
    } else {
        println!("{}", text);
    }
}
