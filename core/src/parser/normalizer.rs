//! Scan report normalization.
//!
//! The report tree has no fixed shape: a host with one address holds a bare
//! `address` object, a host with two holds an array, and any optional section
//! may be missing. Every lookup here goes through [`as_list`] or [`lookup`]
//! so that none of those variations can fail.

use serde_json::Value;
use tracing::debug;

use crate::domain::{or_unknown, CommandOutcome, Device, OperatingSystem, Port, Service, UNKNOWN};
use crate::error::{Error, Result};

use super::document::ScanDocument;
use super::xml;

/// Root element of a scanner report.
pub const REPORT_ROOT: &str = "nmaprun";

/// Coerce a zero/one/many slot into a list.
///
/// Missing and empty slots yield an empty list, a bare object yields a list
/// of one, an array yields its (non-empty) items.
pub fn as_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter(|v| !v.is_null()).collect(),
        Some(other) => vec![other],
    }
}

/// Follow `path` through nested objects. Any missing level yields `None`.
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(key))
}

/// String value under `key`, when present and textual.
fn text<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Converts scanner XML output into [`ScanDocument`]s.
pub struct ScanDocumentNormalizer;

impl ScanDocumentNormalizer {
    /// Normalize raw report text.
    ///
    /// Malformed XML and documents whose root is not a scanner report are
    /// errors; everything else normalizes.
    pub fn normalize(xml_text: &str) -> Result<ScanDocument> {
        let tree = xml::parse(xml_text)?;
        let report = tree.get(REPORT_ROOT).ok_or_else(|| {
            let root = tree
                .as_object()
                .and_then(|m| m.keys().next().cloned())
                .unwrap_or_default();
            Error::UnexpectedDocument(format!("expected <{}> root, found <{}>", REPORT_ROOT, root))
        })?;

        let run_statistics = report.get("runstats").cloned().unwrap_or(Value::Null);
        let host_entries: Vec<Value> = as_list(report.get("host")).into_iter().cloned().collect();

        debug!(hosts = host_entries.len(), "normalized scan report");
        Ok(ScanDocument::new(run_statistics, host_entries))
    }

    /// Normalize the stdout of a finished command.
    pub fn normalize_outcome(outcome: &CommandOutcome) -> Result<ScanDocument> {
        Self::normalize(outcome.stdout())
    }
}

// ============================================================================
// Host extractors
// ============================================================================

/// First address of `addr_type` ("ipv4", "ipv6", "mac") on a host.
pub fn address(host: &Value, addr_type: &str) -> Option<String> {
    as_list(host.get("address"))
        .into_iter()
        .find(|entry| text(entry, "@addrtype") == Some(addr_type))
        .and_then(|entry| text(entry, "@addr"))
        .map(str::to_string)
}

/// First reported hostname of a host.
pub fn hostname(host: &Value) -> Option<String> {
    as_list(lookup(host, &["hostnames", "hostname"]))
        .into_iter()
        .find_map(|entry| text(entry, "@name"))
        .map(str::to_string)
}

/// Best OS match of a host.
///
/// `None` when the host has no OS match at all. Otherwise each field falls
/// back to [`UNKNOWN`] on its own, so a match without class information still
/// reports its name.
pub fn operating_system(host: &Value) -> Option<OperatingSystem> {
    let os = host.get("os")?;
    let best_match = *as_list(os.get("osmatch")).first()?;

    // Newer reports nest osclass in osmatch, older ones put it under os.
    let class = as_list(best_match.get("osclass"))
        .into_iter()
        .next()
        .or_else(|| as_list(os.get("osclass")).into_iter().next());

    Some(OperatingSystem {
        name: or_unknown(text(best_match, "@name")),
        vendor: or_unknown(class.and_then(|c| text(c, "@vendor"))),
        family: or_unknown(class.and_then(|c| text(c, "@osfamily"))),
    })
}

/// Whether the host carries a ports section.
pub fn has_ports(host: &Value) -> bool {
    host.get("ports").is_some()
}

/// All ports of a host, empty when the host has no ports section.
pub fn ports(host: &Value) -> Vec<Port> {
    as_list(lookup(host, &["ports", "port"]))
        .into_iter()
        .map(port)
        .collect()
}

fn port(entry: &Value) -> Port {
    let service = match entry.get("service") {
        Some(service) => Service {
            name: or_unknown(text(service, "@name")),
            product: or_unknown(text(service, "@product")),
            protocol_type: or_unknown(text(service, "@proto")),
        },
        None => Service::default(),
    };

    Port {
        id: or_unknown(text(entry, "@portid")),
        protocol: or_unknown(text(entry, "@protocol")),
        service,
    }
}

/// Build the [`Device`] for one host entry.
///
/// The IPv4 address is the identity; IPv6-only hosts fall back to their IPv6
/// address, hosts with neither get [`UNKNOWN`].
pub fn device(host: &Value) -> Device {
    let ip_address = address(host, "ipv4")
        .or_else(|| address(host, "ipv6"))
        .unwrap_or_else(|| UNKNOWN.to_string());

    Device {
        hostname: hostname(host),
        ip_address,
        mac_address: address(host, "mac"),
        operating_system: operating_system(host),
        ports: has_ports(host).then(|| ports(host)),
    }
}
