// Small status pages: traffic statistics, SMS counters, Wi-Fi radios, LAN.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use super::tables::{Fields, selector, text};
use super::values::{as_int, parse_data_size};

/// Cellular traffic counters in MB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DataUsage {
    pub current_traffic: Option<f64>,
    pub monthly_traffic: Option<f64>,
    pub total_traffic: Option<f64>,
}

pub fn parse_data_usage(html: &str) -> DataUsage {
    let fields = Fields::parse(html);
    let size = |label: &str| fields.get(label).and_then(parse_data_size);
    DataUsage {
        current_traffic: size("Current Traffic:"),
        monthly_traffic: size("Monthly Traffic:"),
        total_traffic: size("Total Traffic:"),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsStatus {
    pub inbox_count: Option<i64>,
    pub outbox_count: Option<i64>,
    /// New messages, from the count beside the highlighted header.
    pub unread_count: Option<i64>,
}

static NEW_MESSAGES: LazyLock<Selector> = LazyLock::new(|| selector("th.text-primary"));

fn unread_from_header(html: &str) -> Option<i64> {
    let doc = Html::parse_document(html);
    let header = doc.select(&NEW_MESSAGES).next()?;
    let count = header
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "th")?;
    as_int(Some(&text(count)))
}

pub fn parse_sms_status(html: &str) -> SmsStatus {
    let fields = Fields::parse(html);
    SmsStatus {
        inbox_count: as_int(fields.get("Inbox")),
        outbox_count: as_int(fields.get("Outbox")),
        unread_count: unread_from_header(html),
    }
}

/// One Wi-Fi radio (`wlan00` is 2.4 GHz, `wlan10` is 5 GHz).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiStatus {
    pub ssid: Option<String>,
    pub channel: Option<i64>,
    /// Absent when the page could not be loaded.
    pub enabled: Option<bool>,
}

pub fn parse_wifi_status(html: &str) -> WifiStatus {
    let fields = Fields::parse(html);
    WifiStatus {
        ssid: fields.get("SSID").map(str::to_owned),
        channel: as_int(fields.get("Channel")),
        enabled: (!html.trim().is_empty()).then(|| html.contains("Enabled")),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanStatus {
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
}

pub fn parse_lan_status(html: &str) -> LanStatus {
    let fields = Fields::parse(html);
    LanStatus {
        ip_address: fields.get("IP Address").map(str::to_owned),
        mac_address: fields.get("MAC-Address").map(str::to_owned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traffic_converts_to_megabytes() {
        let html = "<table>\
            <tr><td>Current Traffic:</td><td>512 KB</td></tr>\
            <tr><td>Monthly Traffic:</td><td>2 GB</td></tr>\
            <tr><td>Total Traffic:</td><td>1 TB</td></tr>\
            </table>";
        let usage = parse_data_usage(html);
        assert_eq!(usage.current_traffic, Some(0.5));
        assert_eq!(usage.monthly_traffic, Some(2048.0));
        assert_eq!(usage.total_traffic, Some(1_048_576.0));
    }

    #[test]
    fn sms_counts_and_unread_header() {
        let html = r#"<table>
            <tr><th class="text-primary">New Message</th><th>3</th></tr>
            <tr><td>Inbox</td><td>12</td></tr>
            <tr><td>Outbox</td><td>4</td></tr>
        </table>"#;
        let sms = parse_sms_status(html);
        assert_eq!(sms.inbox_count, Some(12));
        assert_eq!(sms.outbox_count, Some(4));
        assert_eq!(sms.unread_count, Some(3));
    }

    #[test]
    fn sms_without_header_has_no_unread_count() {
        let sms = parse_sms_status("<table><tr><td>Inbox</td><td>1</td></tr></table>");
        assert_eq!(sms.unread_count, None);
        assert_eq!(sms.inbox_count, Some(1));
    }

    #[test]
    fn wifi_radio_fields() {
        let html = r#"<h4>Status: Enabled</h4><table>
            <tr><td>SSID</td><td>cudy-home</td></tr>
            <tr><td>Channel</td><td>36</td></tr>
        </table>"#;
        let wifi = parse_wifi_status(html);
        assert_eq!(wifi.ssid.as_deref(), Some("cudy-home"));
        assert_eq!(wifi.channel, Some(36));
        assert_eq!(wifi.enabled, Some(true));
        assert_eq!(parse_wifi_status("").enabled, None);
    }

    #[test]
    fn lan_fields() {
        let html = "<table>\
            <tr><td>IP Address</td><td>192.168.10.1</td></tr>\
            <tr><td>MAC-Address</td><td>80:AF:CA:00:11:22</td></tr>\
            </table>";
        let lan = parse_lan_status(html);
        assert_eq!(lan.ip_address.as_deref(), Some("192.168.10.1"));
        assert_eq!(lan.mac_address.as_deref(), Some("80:AF:CA:00:11:22"));
    }
}
