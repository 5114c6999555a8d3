//! nmap command strings.

use std::collections::BTreeSet;

/// nmap flags used by whoshome, in the order they are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NmapFlag {
    /// No port scan, host discovery only.
    ExcludePorts,
    /// Skip host discovery, treat every target as up.
    SkipHostDiscovery,
    /// ICMP echo, timestamp and netmask probes.
    IcmpPing,
    /// ARP ping (local network only, needs root).
    ArpPing,
    CommonPorts,
    FullPortScan,
    ServiceScan,
    OsDetection,
    AggressiveTiming,
    /// XML report on stdout.
    XmlToStdout,
}

impl NmapFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            NmapFlag::ExcludePorts => "-sn",
            NmapFlag::SkipHostDiscovery => "-Pn",
            NmapFlag::IcmpPing => "-PE -PP -PM",
            NmapFlag::ArpPing => "-PR",
            NmapFlag::CommonPorts => "-F",
            NmapFlag::FullPortScan => "-p-",
            NmapFlag::ServiceScan => "-sV",
            NmapFlag::OsDetection => "-O",
            NmapFlag::AggressiveTiming => "-T5",
            NmapFlag::XmlToStdout => "-oX -",
        }
    }
}

/// Ping strategy for host discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingMode {
    Icmp,
    Arp,
    IcmpAndArp,
}

impl PingMode {
    /// Pick the discovery mode from the CLI switches.
    ///
    /// With no switch set, ARP is only used when running as root.
    pub fn select(only_icmp: bool, only_arp: bool, icmp_and_arp: bool, privileged: bool) -> Self {
        if icmp_and_arp || (only_arp && only_icmp) {
            PingMode::IcmpAndArp
        } else if only_arp {
            PingMode::Arp
        } else if only_icmp {
            PingMode::Icmp
        } else if privileged {
            PingMode::IcmpAndArp
        } else {
            PingMode::Icmp
        }
    }
}

/// Port scan depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortScanKind {
    /// Top 100 ports.
    General,
    /// nmap's default 1000 ports.
    Extended,
    /// All 65535 ports.
    Full,
}

/// Builds one nmap command line.
#[derive(Debug, Clone)]
pub struct NmapCommandBuilder {
    target: String,
    sudo: bool,
    flags: BTreeSet<NmapFlag>,
}

impl NmapCommandBuilder {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            sudo: false,
            flags: BTreeSet::new(),
        }
    }

    /// Target `host/cidr`, unless the host already carries a prefix.
    pub fn for_network(host: &str, cidr: &str) -> Self {
        if host.contains('/') {
            Self::new(host)
        } else {
            Self::new(format!("{}/{}", host, cidr))
        }
    }

    pub fn sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    pub fn enable(mut self, flag: NmapFlag) -> Self {
        self.flags.insert(flag);
        self
    }

    pub fn disable(mut self, flag: NmapFlag) -> Self {
        self.flags.remove(&flag);
        self
    }

    pub fn set(self, flag: NmapFlag, enabled: bool) -> Self {
        if enabled {
            self.enable(flag)
        } else {
            self.disable(flag)
        }
    }

    pub fn build(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if self.sudo {
            parts.push("sudo");
        }
        parts.push("nmap");
        for flag in &self.flags {
            parts.push(flag.as_str());
        }
        parts.push(&self.target);
        parts.join(" ")
    }
}

/// `nmap --version`, used to check the installation.
pub fn version_command(sudo: bool) -> String {
    if sudo {
        "sudo nmap --version".to_string()
    } else {
        "nmap --version".to_string()
    }
}

/// Host discovery over a whole network.
pub fn discovery_command(host: &str, cidr: &str, ping: PingMode, sudo: bool) -> String {
    NmapCommandBuilder::for_network(host, cidr)
        .sudo(sudo)
        .enable(NmapFlag::ExcludePorts)
        .enable(NmapFlag::AggressiveTiming)
        .set(NmapFlag::IcmpPing, ping != PingMode::Arp)
        .set(NmapFlag::ArpPing, ping != PingMode::Icmp)
        .enable(NmapFlag::XmlToStdout)
        .build()
}

/// Port and service scan of one already discovered device.
///
/// OS detection is added when the scan runs privileged.
pub fn port_scan_command(ip: &str, kind: PortScanKind, privileged: bool, sudo: bool) -> String {
    NmapCommandBuilder::new(ip)
        .sudo(sudo)
        .enable(NmapFlag::SkipHostDiscovery)
        .enable(NmapFlag::ServiceScan)
        .enable(NmapFlag::AggressiveTiming)
        .set(NmapFlag::CommonPorts, kind == PortScanKind::General)
        .set(NmapFlag::FullPortScan, kind == PortScanKind::Full)
        .set(NmapFlag::OsDetection, privileged || sudo)
        .enable(NmapFlag::XmlToStdout)
        .build()
}

/// Split a host argument on whitespace.
pub fn parse_hosts(host: &str) -> Vec<String> {
    host.split_whitespace().map(str::to_string).collect()
}
