//! whoshome CLI - Discover devices on your network
//!
//! Runs nmap host discovery over one or more networks, lists the devices
//! that answered and can follow up with port and service scans.

mod commands;
mod logging;
mod nmap;
mod output;
mod progress;
mod schedule;

use clap::Parser;
use tracing::{debug, warn};
use whoshome_core::adapters::running_as_root;
use whoshome_core::{Config, ConcurrentScanCoordinator, ConfigStore, ShellRunner};

use commands::scan::ScanSettings;
use nmap::{PingMode, PortScanKind};

#[derive(Parser)]
#[command(name = "whoshome")]
#[command(author, version, about = "Discover the devices on your network")]
struct Cli {
    /// Host or network to scan; separate several with spaces
    #[arg(required_unless_present_any = ["check", "save_config"])]
    host: Option<String>,

    /// CIDR suffix for hosts given without one [default: from config, 24]
    #[arg(short, long)]
    cidr: Option<String>,

    /// Discover hosts with ICMP ping only
    #[arg(long)]
    only_icmp: bool,

    /// Discover hosts with ARP ping only (needs root)
    #[arg(long)]
    only_arp: bool,

    /// Discover hosts with both ICMP and ARP ping
    #[arg(long)]
    icmp_and_arp: bool,

    /// Scan the 100 most common ports of every discovered device
    #[arg(long)]
    port_scan: bool,

    /// Scan the 1000 most common ports of every discovered device
    #[arg(long)]
    extended_port_scan: bool,

    /// Scan all 65535 ports of every discovered device
    #[arg(long)]
    full_port_scan: bool,

    /// Prefix nmap with sudo
    #[arg(long)]
    sudo: bool,

    /// Per-command timeout in seconds [default: from config, 60]
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Maximum number of scans running at once [default: from config, 20]
    #[arg(short, long)]
    workers: Option<usize>,

    /// Repeat the scan every 1m, 5m, 15m, 30m, 45m or 1h
    #[arg(short, long)]
    schedule: Option<String>,

    /// Store --timeout, --workers and --cidr in the config file
    #[arg(long)]
    save_config: bool,

    /// Check that nmap is installed and exit
    #[arg(long)]
    check: bool,

    /// Output in JSON format
    #[arg(long)]
    json: bool,

    /// Disable progress spinners
    #[arg(long)]
    no_progress: bool,

    /// Show debug logs
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn port_scans(&self) -> Vec<PortScanKind> {
        [
            (self.port_scan, PortScanKind::General),
            (self.extended_port_scan, PortScanKind::Extended),
            (self.full_port_scan, PortScanKind::Full),
        ]
        .into_iter()
        .filter_map(|(enabled, kind)| enabled.then_some(kind))
        .collect()
    }
}

async fn load_config(store: Option<&ConfigStore>) -> Config {
    let Some(store) = store else {
        return Config::default();
    };
    store.load().await.unwrap_or_else(|e| {
        warn!(error = %e, "using default configuration");
        Config::default()
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let progress = progress::multi_progress(!cli.no_progress && atty::is(atty::Stream::Stderr));
    logging::init(cli.verbose, progress.clone());

    let store = ConfigStore::new();
    if let Err(e) = &store {
        warn!(error = %e, "config file unavailable");
    }
    let store = store.ok();

    let mut config = load_config(store.as_ref()).await;
    config.apply_overrides(cli.timeout, cli.workers, cli.cidr.clone());
    let options = config.coordinator_options()?;

    if cli.save_config {
        let store = store.ok_or_else(|| anyhow::anyhow!("no location for the config file"))?;
        store.save(&config).await?;
        println!("Saved configuration to {}", store.path().display());
        if cli.host.is_none() && !cli.check {
            return Ok(());
        }
    }

    let privileged = running_as_root();
    debug!(privileged, ?options, "starting");
    let coordinator = ConcurrentScanCoordinator::new(ShellRunner::new(), options)?
        .with_privileged(privileged);

    if cli.check {
        return commands::check::run(&coordinator, cli.sudo).await;
    }

    let hosts = nmap::parse_hosts(cli.host.as_deref().unwrap_or_default());
    if hosts.is_empty() {
        anyhow::bail!("no host given");
    }

    let settings = ScanSettings {
        hosts,
        cidr: config.cidr,
        ping: PingMode::select(
            cli.only_icmp,
            cli.only_arp,
            cli.icmp_and_arp,
            privileged || cli.sudo,
        ),
        sudo: cli.sudo,
        privileged,
        port_scans: cli.port_scans(),
        json: cli.json,
        progress,
    };

    match cli.schedule.as_deref() {
        Some(value) => {
            let period = schedule::parse_schedule(value)?;
            schedule::run_every(period, || commands::scan::run(&coordinator, &settings)).await
        }
        None => commands::scan::run(&coordinator, &settings).await,
    }
}
