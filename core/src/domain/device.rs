//! Device, port, service and operating system domain models.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Placeholder returned for any text field the scan report left out.
pub const UNKNOWN: &str = "(Unknown)";

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// Resolve an optional text field to its value or the [`UNKNOWN`] sentinel.
pub fn or_unknown(value: Option<&str>) -> String {
    value.map(str::to_string).unwrap_or_else(unknown)
}

// ============================================================================
// OperatingSystem
// ============================================================================

/// Best operating system guess for a host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperatingSystem {
    pub name: String,
    pub vendor: String,
    pub family: String,
}

impl Default for OperatingSystem {
    fn default() -> Self {
        Self {
            name: unknown(),
            vendor: unknown(),
            family: unknown(),
        }
    }
}

impl std::fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.vendor, self.family)
    }
}

// ============================================================================
// Service / Port
// ============================================================================

/// Service detected behind an open port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub product: String,
    pub protocol_type: String,
}

impl Default for Service {
    fn default() -> Self {
        Self {
            name: unknown(),
            product: unknown(),
            protocol_type: unknown(),
        }
    }
}

/// A scanned port on a host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Port {
    /// Numeric port id as reported (e.g. "22").
    pub id: String,
    /// Transport protocol ("tcp", "udp").
    pub protocol: String,
    pub service: Service,
}

impl Port {
    /// Get the formatted port for display (e.g., "22/tcp").
    pub fn display_port(&self) -> String {
        format!("{}/{}", self.id, self.protocol)
    }
}

// ============================================================================
// Device
// ============================================================================

/// A host discovered by a scan.
///
/// `ip_address` is the device identity; two devices with the same IP are the
/// same device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    pub hostname: Option<String>,
    pub ip_address: String,
    pub mac_address: Option<String>,
    pub operating_system: Option<OperatingSystem>,
    pub ports: Option<Vec<Port>>,
}

impl Device {
    /// Create a device with only its address known.
    pub fn new(ip_address: impl Into<String>) -> Self {
        Self {
            hostname: None,
            ip_address: ip_address.into(),
            mac_address: None,
            operating_system: None,
            ports: None,
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac_address = Some(mac.into());
        self
    }

    /// Hostname or the [`UNKNOWN`] sentinel.
    pub fn display_hostname(&self) -> &str {
        self.hostname.as_deref().unwrap_or(UNKNOWN)
    }

    /// Ports of this device, empty when none were scanned.
    pub fn ports(&self) -> &[Port] {
        self.ports.as_deref().unwrap_or_default()
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.ip_address, self.display_hostname())?;
        if let Some(mac) = &self.mac_address {
            write!(f, " [{}]", mac)?;
        }
        Ok(())
    }
}

/// Number of distinct devices in one result set, keyed by IP address.
///
/// Hosts without an address cannot be matched against each other, so each
/// one counts on its own.
pub fn count_unique_devices(devices: &[Device]) -> usize {
    let (unaddressed, addressed): (Vec<&Device>, Vec<&Device>) =
        devices.iter().partition(|d| d.ip_address == UNKNOWN);
    let distinct = addressed
        .iter()
        .map(|d| d.ip_address.as_str())
        .collect::<HashSet<_>>()
        .len();
    distinct + unaddressed.len()
}
