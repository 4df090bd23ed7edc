// Connected clients: the device list (`admin/network/devices/devlist`)
// and the client count summary (`admin/network/devices/status`).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tables::{Fields, pattern, selector};
use super::values::{as_int, parse_speed};

/// One client row of the device list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectedDevice {
    pub hostname: Option<String>,
    pub ip: Option<String>,
    pub mac: Option<String>,
    /// Mbit/s.
    pub up_speed: Option<f64>,
    /// Mbit/s.
    pub down_speed: Option<f64>,
}

/// Device list summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevicesInfo {
    pub device_count: usize,
    pub top_downloader: Option<ConnectedDevice>,
    pub top_uploader: Option<ConnectedDevice>,
    /// Total Mbit/s over all clients. Absent when there are no clients.
    pub total_down_speed: Option<f64>,
    pub total_up_speed: Option<f64>,
    /// Clients named in the tracked device list, keyed by the MAC or
    /// hostname that matched.
    pub detailed: BTreeMap<String, ConnectedDevice>,
    pub devices: Vec<ConnectedDevice>,
}

static ROWS: LazyLock<Selector> = LazyLock::new(|| selector("table tr"));
static ID_DIVS: LazyLock<Selector> = LazyLock::new(|| selector("td div[id]"));
static MOBILE: LazyLock<Selector> = LazyLock::new(|| selector("p.visible-xs"));

/// Text of an element with each `<br>` read as a line break.
fn text_with_breaks(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) if e.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out.trim().to_owned()
}

fn lines(content: &str) -> Vec<&str> {
    content
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

fn owned(line: Option<&&str>) -> Option<String> {
    line.map(|l| (*l).to_owned())
}

/// Every client row that carries an IP or a MAC.
pub fn list_devices(html: &str) -> Vec<ConnectedDevice> {
    if html.trim().is_empty() {
        return Vec::new();
    }
    let doc = Html::parse_document(html);
    let mut devices = Vec::new();

    for row in doc.select(&ROWS) {
        let mut device = ConnectedDevice::default();
        for div in row.select(&ID_DIVS) {
            let Some(id) = div.value().attr("id") else {
                continue;
            };
            let Some(content) = div.select(&MOBILE).next().map(text_with_breaks) else {
                continue;
            };
            if !content.contains('\n') {
                continue;
            }
            let parts = lines(&content);
            if id.ends_with("ipmac") {
                device.ip = owned(parts.first());
                device.mac = owned(parts.get(1));
            } else if id.ends_with("speed") {
                device.up_speed = parts.first().and_then(|s| parse_speed(s));
                device.down_speed = parts.get(1).and_then(|s| parse_speed(s));
            } else if id.ends_with("hostname") {
                device.hostname = owned(parts.first());
            }
        }
        if device.ip.is_some() || device.mac.is_some() {
            devices.push(device);
        }
    }
    devices
}

/// First device with the highest value of `speed`.
fn top_by(
    devices: &[ConnectedDevice],
    speed: impl Fn(&ConnectedDevice) -> Option<f64>,
) -> Option<&ConnectedDevice> {
    let mut best: Option<(&ConnectedDevice, f64)> = None;
    for device in devices {
        let value = speed(device).unwrap_or(f64::NEG_INFINITY);
        if best.is_none_or(|(_, top)| value > top) {
            best = Some((device, value));
        }
    }
    best.map(|(device, _)| device)
}

/// Parse the device list, keeping details for clients named in
/// `device_list` (comma separated MACs or hostnames).
pub fn parse_devices(html: &str, device_list: &str) -> DevicesInfo {
    let devices = list_devices(html);
    let mut info = DevicesInfo {
        device_count: devices.len(),
        ..DevicesInfo::default()
    };
    if devices.is_empty() {
        return info;
    }

    info.top_downloader = top_by(&devices, |d| d.down_speed).cloned();
    info.top_uploader = top_by(&devices, |d| d.up_speed).cloned();
    info.total_down_speed = Some(devices.iter().filter_map(|d| d.down_speed).sum());
    info.total_up_speed = Some(devices.iter().filter_map(|d| d.up_speed).sum());

    let tracked: Vec<&str> = device_list
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    for device in &devices {
        for key in [&device.mac, &device.hostname].into_iter().flatten() {
            if tracked.contains(&key.as_str()) {
                info.detailed.insert(key.clone(), device.clone());
            }
        }
    }
    info.devices = devices;
    info
}

/// Client counts from the device status page or the panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCounts {
    pub wifi_2g: Option<i64>,
    pub wifi_5g: Option<i64>,
    pub wired: Option<i64>,
    pub total: Option<i64>,
}

const WIFI_2G_KEYS: &[&str] = &[
    "2.4G Clients",
    "2.4G clients",
    "2.4GHz Clients",
    "WiFi 2.4G Clients",
    "Wireless 2.4G",
    "2.4G",
    "2.4 GHz",
    "2.4GHz",
    "WLAN 2.4G",
    "Wi-Fi 2.4G",
    "2.4G WiFi",
];

const WIFI_5G_KEYS: &[&str] = &[
    "5G Clients",
    "5G clients",
    "5GHz Clients",
    "WiFi 5G Clients",
    "Wireless 5G",
    "5G",
    "5 GHz",
    "5GHz",
    "WLAN 5G",
    "Wi-Fi 5G",
    "5G WiFi",
];

const TOTAL_KEYS: &[&str] = &[
    "Total Clients",
    "Total clients",
    "Total",
    "Connected Clients",
    "Online Clients",
    "All Clients",
    "Clients",
    "Online",
    "Connected",
];

static SCRIPT_2G: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        pattern(r#"(?i)["']?(?:wifi_?2g|wlan_?2g|clients_?2g|2g_?clients)["']?\s*[=:]\s*(\d+)"#),
        pattern(r"(?i)2\.4G.*?(\d+)\s*(?:client|device)"),
    ]
});
static SCRIPT_5G: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        pattern(r#"(?i)["']?(?:wifi_?5g|wlan_?5g|clients_?5g|5g_?clients)["']?\s*[=:]\s*(\d+)"#),
        pattern(r"(?i)5G.*?(\d+)\s*(?:client|device)"),
    ]
});
static SCRIPT_TOTAL: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        pattern(
            r#"(?i)["']?(?:total_?clients|clients_?total|online_?clients)["']?\s*[=:]\s*(\d+)"#,
        ),
        pattern(r"(?i)(?:total|all).*?(\d+)\s*(?:client|device)"),
    ]
});

fn first_capture(patterns: &[Regex], html: &str) -> Option<i64> {
    patterns
        .iter()
        .find_map(|re| re.captures(html))
        .and_then(|caps| as_int(caps.get(1).map(|m| m.as_str())))
}

/// Parse client counts, falling back to script variables when the
/// tables carry none. A missing total is summed from the parts.
pub fn parse_devices_status(html: &str) -> ClientCounts {
    let fields = Fields::parse(html);
    let mut counts = ClientCounts {
        wifi_2g: fields.first_int(WIFI_2G_KEYS),
        wifi_5g: fields.first_int(WIFI_5G_KEYS),
        wired: as_int(fields.get("Wired")),
        total: fields.first_int(TOTAL_KEYS),
    };

    if !html.is_empty()
        && counts.wifi_2g.is_none()
        && counts.wifi_5g.is_none()
        && counts.total.is_none()
    {
        counts.wifi_2g = first_capture(SCRIPT_2G.as_slice(), html);
        counts.wifi_5g = first_capture(SCRIPT_5G.as_slice(), html);
        counts.total = first_capture(SCRIPT_TOTAL.as_slice(), html);
    }

    if counts.total.is_none() && (counts.wifi_2g.is_some() || counts.wifi_5g.is_some()) {
        counts.total = Some(
            counts.wifi_2g.unwrap_or(0) + counts.wifi_5g.unwrap_or(0) + counts.wired.unwrap_or(0),
        );
    }

    debug!(?counts, "parsed client counts");
    counts
}
