// WAN, VPN and DHCP status pages.

use serde::{Deserialize, Serialize};

use super::tables::Fields;
use super::values::{clean_text, parse_duration_secs, split_upload_download};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpnStatus {
    pub protocol: Option<String>,
    /// Connected VPN clients as shown by the router.
    pub clients: Option<String>,
}

pub fn parse_vpn_status(html: &str) -> VpnStatus {
    let fields = Fields::parse(html);
    VpnStatus {
        protocol: fields.get("Protocol").map(str::to_owned),
        clients: fields.get("Devices").map(str::to_owned),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WanStatus {
    pub protocol: Option<String>,
    /// Seconds.
    pub connected_time: Option<u64>,
    pub mac_address: Option<String>,
    pub public_ip: Option<String>,
    pub wan_ip: Option<String>,
    pub subnet_mask: Option<String>,
    pub gateway: Option<String>,
    pub dns: Option<String>,
    /// Session traffic in MB.
    pub session_upload: Option<f64>,
    pub session_download: Option<f64>,
}

impl WanStatus {
    /// Whether any field was found on the page.
    pub fn has_values(&self) -> bool {
        *self != Self::default()
    }
}

/// Labels seen only on a real WAN status page.
const WAN_MARKERS: &[&str] = &["public ip", "ip address", "gateway", "subnet", "protocol"];

/// Some models answer the WAN URL with a generic page; only pages that
/// mention WAN details are worth parsing.
pub fn looks_like_wan_page(html: &str) -> bool {
    let lower = html.to_lowercase();
    WAN_MARKERS.iter().any(|marker| lower.contains(marker))
}

pub fn parse_wan_status(html: &str) -> WanStatus {
    let fields = Fields::parse(html);
    let pick = |labels: &[&str]| clean_text(fields.first(labels));

    let (session_upload, session_download) = fields
        .first(&["Upload / Download", "Upload/Download", "Upload/Down"])
        .map_or((None, None), split_upload_download);

    WanStatus {
        protocol: pick(&["Protocol", "Connection Type", "WAN Protocol"]),
        connected_time: fields
            .first(&["Connected Time", "Connect Time", "Connection Time"])
            .and_then(parse_duration_secs),
        mac_address: pick(&["MAC-Address", "MAC Address", "WAN MAC"]),
        public_ip: pick(&["Public IP", "Public IPv4", "WAN Public IP"]),
        wan_ip: pick(&["IP Address", "WAN IP", "IP"]),
        subnet_mask: pick(&["Subnet Mask", "Subnet", "Netmask", "Mask"]),
        gateway: pick(&["Gateway", "Default Gateway"]),
        dns: pick(&["DNS", "Preferred DNS", "Primary DNS"]),
        session_upload,
        session_download,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpStatus {
    pub ip_start: Option<String>,
    pub ip_end: Option<String>,
    pub preferred_dns: Option<String>,
    pub default_gateway: Option<String>,
    pub lease_time: Option<String>,
}

pub fn parse_dhcp_status(html: &str) -> DhcpStatus {
    let fields = Fields::parse(html);
    let pick = |labels: &[&str]| clean_text(fields.first(labels));
    DhcpStatus {
        ip_start: pick(&["IP Start", "Start IP"]),
        ip_end: pick(&["IP End", "End IP"]),
        preferred_dns: pick(&["Preferred DNS", "DNS", "Primary DNS"]),
        default_gateway: pick(&["Default Gateway", "Gateway"]),
        lease_time: pick(&["Leasetime", "Lease Time"]),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const WAN: &str = "<table>\
        <tr><td>Protocol</td><td>DHCP*</td></tr>\
        <tr><td>Connected Time</td><td>01:00:00</td></tr>\
        <tr><td>MAC-Address</td><td>80:AF:CA:00:11:23</td></tr>\
        <tr><td>Public IP</td><td>203.0.113.10</td></tr>\
        <tr><td>IP Address</td><td>203.0.113.10</td></tr>\
        <tr><td>Subnet Mask</td><td>255.255.255.0</td></tr>\
        <tr><td>Gateway</td><td>192.0.2.1</td></tr>\
        <tr><td>DNS</td><td>-</td></tr>\
        <tr><td>Upload / Download</td><td>10.0 MB / 200.5 MB</td></tr>\
        </table>";

    #[test]
    fn wan_page_yields_documented_fields() {
        assert!(looks_like_wan_page(WAN));
        let wan = parse_wan_status(WAN);
        assert_eq!(
            wan,
            WanStatus {
                protocol: Some("DHCP".into()),
                connected_time: Some(3600),
                mac_address: Some("80:AF:CA:00:11:23".into()),
                public_ip: Some("203.0.113.10".into()),
                wan_ip: Some("203.0.113.10".into()),
                subnet_mask: Some("255.255.255.0".into()),
                gateway: Some("192.0.2.1".into()),
                dns: None,
                session_upload: Some(10.0),
                session_download: Some(200.5),
            }
        );
        assert!(wan.has_values());
    }

    #[test]
    fn gateway_falls_back_to_alternate_label() {
        let html = WAN.replace("<td>Gateway</td>", "<td>Default Gateway</td>");
        assert_eq!(parse_wan_status(&html).gateway.as_deref(), Some("192.0.2.1"));
    }

    #[test]
    fn empty_wan_table_has_no_values() {
        let wan = parse_wan_status("<table></table>");
        assert!(!wan.has_values());
        assert!(!looks_like_wan_page("<p>Status</p>"));
    }

    #[test]
    fn vpn_and_dhcp_fields() {
        let vpn = parse_vpn_status(
            "<table><tr><td>Protocol</td><td>OpenVPN</td></tr><tr><td>Devices</td><td>2</td></tr></table>",
        );
        assert_eq!(vpn.protocol.as_deref(), Some("OpenVPN"));
        assert_eq!(vpn.clients.as_deref(), Some("2"));

        let dhcp = parse_dhcp_status(
            "<table>\
             <tr><td>IP Start</td><td>192.168.10.100</td></tr>\
             <tr><td>IP End</td><td>192.168.10.250</td></tr>\
             <tr><td>Lease Time</td><td>12h</td></tr>\
             <tr><td>Gateway</td><td>N/A</td></tr>\
             </table>",
        );
        assert_eq!(dhcp.ip_start.as_deref(), Some("192.168.10.100"));
        assert_eq!(dhcp.ip_end.as_deref(), Some("192.168.10.250"));
        assert_eq!(dhcp.lease_time.as_deref(), Some("12h"));
        assert_eq!(dhcp.default_gateway, None);
    }
}
