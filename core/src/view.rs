//! Read-only queries over a normalized scan report.

use std::sync::OnceLock;

use serde_json::Value;

use crate::domain::{CommandOutcome, Device, OperatingSystem, Port, UNKNOWN};
use crate::error::Result;
use crate::parser::normalizer::{self, lookup};
use crate::parser::{ScanDocument, ScanDocumentNormalizer};

/// Query surface over one [`ScanDocument`].
///
/// Every query is total: missing or oddly shaped report data resolves to a
/// sentinel, an empty list or `None`.
#[derive(Debug)]
pub struct ScanResultView {
    document: ScanDocument,
    devices: OnceLock<Vec<Device>>,
}

impl ScanResultView {
    pub fn new(document: ScanDocument) -> Self {
        Self {
            document,
            devices: OnceLock::new(),
        }
    }

    /// Parse report text and wrap it in a view.
    pub fn parse(xml: &str) -> Result<Self> {
        ScanDocumentNormalizer::normalize(xml).map(Self::new)
    }

    /// Parse the stdout of a finished scan command.
    pub fn from_outcome(outcome: &CommandOutcome) -> Result<Self> {
        ScanDocumentNormalizer::normalize_outcome(outcome).map(Self::new)
    }

    pub fn document(&self) -> &ScanDocument {
        &self.document
    }

    fn host_statistic(&self, attribute: &str) -> Option<&Value> {
        lookup(self.document.run_statistics(), &["hosts", attribute])
    }

    /// Number of hosts the scanner reported as up, exactly as reported.
    ///
    /// Accepts the textual numeral reports carry; anything unreadable is 0.
    pub fn total_hosts_up(&self) -> u64 {
        match self.host_statistic("@up") {
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
            _ => 0,
        }
    }

    /// Number of hosts scanned, verbatim from the report.
    ///
    /// [`UNKNOWN`] when the report has no total.
    pub fn total_hosts_scanned(&self) -> String {
        match self.host_statistic("@total") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => UNKNOWN.to_string(),
        }
    }

    /// Number of host entries in the report.
    pub fn host_count(&self) -> usize {
        self.document.host_count()
    }

    /// One device per host entry, in report order. Computed once.
    pub fn devices(&self) -> &[Device] {
        self.devices.get_or_init(|| {
            self.document
                .host_entries()
                .iter()
                .map(normalizer::device)
                .collect()
        })
    }

    /// Device for the host at `index`, `None` past the end.
    pub fn device_at(&self, index: usize) -> Option<Device> {
        self.devices().get(index).cloned()
    }

    /// OS guess for the host at `index`.
    pub fn os_for_host(&self, index: usize) -> Option<OperatingSystem> {
        self.document
            .host(index)
            .and_then(normalizer::operating_system)
    }

    /// Ports of the host at `index`; empty when there are none or no such host.
    pub fn ports_for_host(&self, index: usize) -> Vec<Port> {
        self.document
            .host(index)
            .map(normalizer::ports)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// Discovery run over a /24 with three hosts up.
    const DISCOVERY_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<?xml-stylesheet href="file:///usr/share/nmap/nmap.xsl" type="text/xsl"?>
<nmaprun scanner="nmap" args="nmap -sn -T5 -PE -PP -PM -PR -oX - 192.168.1.0/24" start="1718000000" version="7.95" xmloutputversion="1.05">
<verbose level="0"/>
<debugging level="0"/>
<host><status state="up" reason="arp-response" reason_ttl="0"/>
<address addr="192.168.1.1" addrtype="ipv4"/>
<address addr="00:11:22:33:44:55" addrtype="mac" vendor="Netgear"/>
<hostnames>
<hostname name="router.lan" type="PTR"/>
</hostnames>
<times srtt="2100" rttvar="5000" to="100000"/>
</host>
<host><status state="up" reason="arp-response" reason_ttl="0"/>
<address addr="192.168.1.23" addrtype="ipv4"/>
<address addr="AA:BB:CC:DD:EE:FF" addrtype="mac"/>
<hostnames>
</hostnames>
</host>
<host><status state="up" reason="localhost-response" reason_ttl="0"/>
<address addr="192.168.1.50" addrtype="ipv4"/>
<hostnames>
<hostname name="workstation" type="user"/>
<hostname name="workstation.lan" type="PTR"/>
</hostnames>
</host>
<runstats><finished time="1718000003" timestr="Mon Jun 10 08:13:23 2024" summary="Nmap done; 256 IP addresses (3 hosts up) scanned in 2.85 seconds" elapsed="2.85" exit="success"/><hosts up="3" down="253" total="256"/>
</runstats>
</nmaprun>"#;

    /// Port and OS scan of a single host.
    const SINGLE_HOST_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nmaprun scanner="nmap" args="sudo nmap -F -T5 -A -oX - 192.168.1.1" version="7.95">
<host starttime="1718000100" endtime="1718000130"><status state="up" reason="arp-response"/>
<address addr="192.168.1.1" addrtype="ipv4"/>
<hostnames/>
<ports><extraports state="closed" count="97"/>
<port protocol="tcp" portid="22"><state state="open" reason="syn-ack"/><service name="ssh" product="OpenSSH" version="9.6" method="probed" conf="10"/></port>
<port protocol="tcp" portid="53"><state state="open" reason="syn-ack"/><service name="domain" method="table" conf="3"/></port>
<port protocol="tcp" portid="80"><state state="open" reason="syn-ack"/></port>
</ports>
<os><portused state="open" proto="tcp" portid="22"/>
<osmatch name="Linux 5.0 - 5.14" accuracy="98" line="67000">
<osclass type="general purpose" vendor="Linux" osfamily="Linux" osgen="5.X" accuracy="98"/>
</osmatch>
</os>
</host>
<runstats><finished time="1718000130" elapsed="30.1" exit="success"/><hosts up="1" down="0" total="1"/></runstats>
</nmaprun>"#;

    #[test]
    fn test_run_statistics_use_literal_counts() {
        let view = ScanResultView::parse(DISCOVERY_REPORT).unwrap();
        assert_eq!(view.total_hosts_up(), 3);
        assert_eq!(view.total_hosts_scanned(), "256");
        assert_eq!(view.devices().len(), 3);
        assert_eq!(view.host_count(), 3);
    }

    #[test]
    fn test_devices_in_report_order() {
        let view = ScanResultView::parse(DISCOVERY_REPORT).unwrap();
        let devices = view.devices();

        assert_eq!(devices[0].ip_address, "192.168.1.1");
        assert_eq!(devices[0].mac_address.as_deref(), Some("00:11:22:33:44:55"));
        assert_eq!(devices[0].hostname.as_deref(), Some("router.lan"));

        // Empty <hostnames> element
        assert_eq!(devices[1].ip_address, "192.168.1.23");
        assert_eq!(devices[1].hostname, None);

        // No MAC for the scanning host itself
        assert_eq!(devices[2].mac_address, None);
        assert_eq!(devices[2].hostname.as_deref(), Some("workstation"));
        assert_eq!(devices[2].ports, None);
    }

    #[test]
    fn test_devices_is_stable() {
        let view = ScanResultView::parse(DISCOVERY_REPORT).unwrap();
        let first = view.devices().to_vec();
        let second = view.devices().to_vec();
        assert_eq!(first, second);
        assert_eq!(view.device_at(1), Some(first[1].clone()));
    }

    #[test]
    fn test_single_host_report_is_indexable() {
        let view = ScanResultView::parse(SINGLE_HOST_REPORT).unwrap();
        assert_eq!(view.devices().len(), 1);
        assert_eq!(view.total_hosts_up(), 1);
        assert_eq!(view.total_hosts_scanned(), "1");

        let device = view.device_at(0).unwrap();
        assert_eq!(device.ip_address, "192.168.1.1");
        assert_eq!(device.hostname, None);
        assert_eq!(device.ports().len(), 3);
        assert!(view.device_at(1).is_none());
    }

    #[test]
    fn test_ports_and_os_for_host() {
        let view = ScanResultView::parse(SINGLE_HOST_REPORT).unwrap();

        let ports = view.ports_for_host(0);
        assert_eq!(ports.len(), 3);
        assert_eq!(ports[0].id, "22");
        assert_eq!(ports[0].protocol, "tcp");
        assert_eq!(ports[0].service.product, "OpenSSH");
        assert_eq!(ports[1].service.product, UNKNOWN);
        assert_eq!(ports[2].service.name, UNKNOWN);

        let os = view.os_for_host(0).unwrap();
        assert_eq!(os.name, "Linux 5.0 - 5.14");
        assert_eq!(os.vendor, "Linux");
        assert_eq!(os.family, "Linux");

        assert!(view.ports_for_host(5).is_empty());
        assert!(view.os_for_host(5).is_none());
    }

    #[test]
    fn test_host_without_ports_or_os() {
        let view = ScanResultView::parse(DISCOVERY_REPORT).unwrap();
        assert!(view.ports_for_host(0).is_empty());
        assert!(view.os_for_host(0).is_none());
    }

    #[test]
    fn test_empty_report() {
        let view = ScanResultView::parse(
            r#"<nmaprun><runstats><hosts up="0" down="16" total="16"/></runstats></nmaprun>"#,
        )
        .unwrap();
        assert!(view.devices().is_empty());
        assert_eq!(view.total_hosts_up(), 0);
        assert_eq!(view.total_hosts_scanned(), "16");
        assert!(view.device_at(0).is_none());
    }

    #[test]
    fn test_missing_run_statistics() {
        let view = ScanResultView::parse("<nmaprun><runstats><finished/></runstats></nmaprun>").unwrap();
        assert_eq!(view.total_hosts_up(), 0);
        assert_eq!(view.total_hosts_scanned(), UNKNOWN);
    }

    #[test]
    fn test_from_failed_outcome_is_parse_error() {
        // A failed scan usually has empty stdout.
        let outcome = CommandOutcome::completed("nmap", "", "QUITTING!", Some(1));
        assert!(matches!(
            ScanResultView::from_outcome(&outcome),
            Err(Error::Parse(_))
        ));
    }
}
