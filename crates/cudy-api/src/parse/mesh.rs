// Mesh topology.
//
// Satellites show up in several layouts depending on firmware: panels,
// table rows, `div`s with mesh-ish ids, or a JSON array in a script.
// Richer per-node data comes from the `clients?clients=all` JSON feed
// and the per-node `devstatus`/`devlist` fragments.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::tables::{Fields, pattern, selector, text};
use super::values::{format_compact_mac, normalize_mac, pseudo_mac};
use crate::error::Error;

/// Client id the mesh feed uses for the main router.
pub const MAIN_ROUTER_ID: &str = "000000000000";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Online,
    Offline,
}

impl NodeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mesh satellite, keyed by MAC in [`MeshOverview::devices`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshNode {
    pub mac_address: String,
    pub name: Option<String>,
    pub model: Option<String>,
    pub hardware: Option<String>,
    pub firmware_version: Option<String>,
    pub ip_address: Option<String>,
    pub backhaul: Option<String>,
    pub status: Option<NodeStatus>,
    pub led_status: Option<String>,
    pub connected_devices: Option<usize>,
}

impl MeshNode {
    fn new(mac_address: String) -> Self {
        Self {
            mac_address,
            status: Some(NodeStatus::Online),
            ..Self::default()
        }
    }

    /// Fold in a `devstatus`/`devlist` reading. The connected-device count
    /// always comes from the fragment; other fields only fill gaps.
    pub fn merge_detail(&mut self, detail: MeshClientDetail) {
        fn fill(slot: &mut Option<String>, value: Option<String>) {
            let missing = slot
                .as_deref()
                .is_none_or(|v| v.is_empty() || v == "Unknown");
            if missing && value.is_some() {
                *slot = value;
            }
        }

        self.connected_devices = Some(detail.connected_devices);
        fill(&mut self.name, detail.name);
        fill(&mut self.model, detail.model);
        fill(&mut self.ip_address, detail.ip_address);
        fill(&mut self.firmware_version, detail.firmware_version);
        fill(&mut self.backhaul, detail.backhaul);
        if self.status.is_none() {
            self.status = Some(detail.status);
        }
    }

    /// Overwrite fields with those present on `other`.
    pub fn update_from(&mut self, other: MeshNode) {
        fn take(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.name, other.name);
        take(&mut self.model, other.model);
        take(&mut self.hardware, other.hardware);
        take(&mut self.firmware_version, other.firmware_version);
        take(&mut self.ip_address, other.ip_address);
        take(&mut self.backhaul, other.backhaul);
        take(&mut self.led_status, other.led_status);
        self.status = other.status.or(self.status);
        self.connected_devices = other.connected_devices.or(self.connected_devices);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshOverview {
    /// Satellites only; the main router is not counted.
    pub mesh_count: usize,
    pub main_router_name: Option<String>,
    pub main_router_led_status: Option<String>,
    pub devices: BTreeMap<String, MeshNode>,
}

static MAC: LazyLock<Regex> = LazyLock::new(|| pattern(r"([0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}"));
static LEADING_MAC: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^([0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}"));
static IPV4: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})"));
static VERSION: LazyLock<Regex> = LazyLock::new(|| pattern(r"\d+\.\d+\.\d+(?:\.\d+)?"));

static NAME_LABELS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        pattern(r"(?i)(?:Device\s*Name|Name|Hostname)[:\s]*([^\n]+)"),
        pattern(r"(?i)(?:Node\s*Name)[:\s]*([^\n]+)"),
    ]
});
static MODEL_LABELS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        pattern(r"(?i)(?:Model|Device\s*Model|Product)[:\s]*([^\n]+)"),
        pattern(r"(?i)(Cudy\s*[A-Z0-9]+)"),
    ]
});
static FIRMWARE_LABELS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        pattern(r"(?i)(?:Firmware|FW|Version|Firmware\s*Version)[:\s]*([^\n]+)"),
        pattern(r"(\d+\.\d+\.\d+[^\n]*)"),
    ]
});
static OFFLINE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)offline|disconnected"));

static NAMED_NODE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)(Main\s*Router|Satellite|Node\s*\d+|^Mesh$)"));
static DEVICE_NAME_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?i)Device\s*Name[:\s]+([A-Za-z][A-Za-z0-9\s\-_]+?)(?:\s+(?:Mesh|Device|Status|More)|$)",
    )
});
static PANEL_MODEL: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"((?:Cudy\s*)?[A-Z]?\d{3,4}[A-Z]?)"));
static PANEL_OFFLINE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)offline|disconnected|down"));
static PANEL_ONLINE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)online|connected|up"));
static ROW_MODEL: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)(Cudy\s*[A-Z0-9]+|M[0-9]{4})"));

static NODE_DIV_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)mesh|node|satellite"));

static SCRIPT_ARRAYS: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    [
        pattern(r"(?i)(?:meshNodes|mesh_nodes|nodes)\s*[=:]\s*(\[[\s\S]*?\])\s*[;,]"),
        pattern(r"(?i)(?:satellites|mesh_devices)\s*[=:]\s*(\[[\s\S]*?\])\s*[;,]"),
        pattern(r"(?i)(?:unit_list|mesh_units)\s*[=:]\s*(\[[\s\S]*?\])\s*[;,]"),
        pattern(r#"(?i)"nodes"\s*:\s*(\[[\s\S]*?\])"#),
        pattern(r#"(?i)"devices"\s*:\s*(\[[\s\S]*?\])"#),
    ]
});

static PANELS: LazyLock<Selector> = LazyLock::new(|| selector("div.panel"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| selector("table tr"));
static CELLS: LazyLock<Selector> = LazyLock::new(|| selector("td, th"));
static ID_DIVS: LazyLock<Selector> = LazyLock::new(|| selector("div[id]"));

const MAIN_ROUTER_NAMES: &[&str] = &["main router", "mainrouter", "main_router", "router"];
const SHORT_NODE_NAMES: &[&str] = &["mesh", "satellite", "node", "extender", "repeater"];
const NAV_WORDS: &[&str] = &["logout", "menu", "settings", "wizard", "more details"];

/// Element text with one line per text node.
fn text_lines(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn first_group(patterns: &[Regex], haystack: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(haystack))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_owned())
}

/// First version-looking token that is not the node's IP address.
fn version_token(haystack: &str, ip: Option<&str>) -> Option<String> {
    VERSION
        .find_iter(haystack)
        .map(|m| m.as_str())
        .find(|v| Some(*v) != ip && !IPV4.is_match(v))
        .map(str::to_owned)
}

/// Generic node block: requires a MAC, then reads labelled fields.
fn node_from_block(block: &str) -> Option<MeshNode> {
    let mac = MAC.find(block)?;
    let mut node = MeshNode::new(normalize_mac(mac.as_str()));
    node.name = first_group(NAME_LABELS.as_slice(), block);
    node.model = first_group(MODEL_LABELS.as_slice(), block);
    node.firmware_version = first_group(FIRMWARE_LABELS.as_slice(), block);
    node.ip_address = capture(&IPV4, block);
    if OFFLINE.is_match(block) {
        node.status = Some(NodeStatus::Offline);
    }
    Some(node)
}

/// Cudy panel layout, where satellites may be shown by name only.
fn node_from_panel(block: &str) -> Option<MeshNode> {
    let lower = block.trim().to_lowercase();
    let short_name = SHORT_NODE_NAMES
        .iter()
        .any(|n| lower == *n || lower.starts_with(&format!("{n} ")));

    if block.chars().count() < 20 && !short_name {
        return None;
    }
    if NAV_WORDS.iter().any(|w| lower.contains(w)) && !NAMED_NODE.is_match(block) {
        return None;
    }
    if lower.matches("device name").count() > 1 && !lower.contains("main router") {
        return None;
    }

    let name = if short_name {
        Some(block.trim().to_owned())
    } else {
        capture(&NAMED_NODE, block).or_else(|| {
            capture(&DEVICE_NAME_VALUE, block).filter(|n| {
                !matches!(
                    n.to_lowercase().as_str(),
                    "device name" | "name" | "hostname" | "device"
                )
            })
        })
    };
    let name = name?;

    let mac = MAC
        .find(block)
        .map_or_else(|| pseudo_mac(&name), |m| normalize_mac(m.as_str()));
    let mut node = MeshNode::new(mac);
    node.ip_address = capture(&IPV4, block);
    node.model = capture(&PANEL_MODEL, block);
    node.firmware_version = version_token(block, node.ip_address.as_deref());
    if PANEL_OFFLINE.is_match(block) {
        node.status = Some(NodeStatus::Offline);
    } else if PANEL_ONLINE.is_match(block) {
        node.status = Some(NodeStatus::Online);
    }
    node.name = Some(name);
    Some(node)
}

fn node_from_row(row: ElementRef<'_>) -> Option<MeshNode> {
    let cells: Vec<String> = row.select(&CELLS).map(text).collect();
    if cells.len() < 2 {
        return None;
    }
    let joined = cells.join(" ");
    let mac = MAC.find(&joined)?;

    let mut node = MeshNode::new(normalize_mac(mac.as_str()));
    node.name = cells
        .first()
        .filter(|first| !first.is_empty() && !LEADING_MAC.is_match(first))
        .cloned();
    node.ip_address = cells.iter().find_map(|cell| capture(&IPV4, cell));
    node.model = capture(&ROW_MODEL, &joined);
    node.firmware_version = version_token(&joined, node.ip_address.as_deref());
    Some(node)
}

fn json_str(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| item.get(key).and_then(Value::as_str))
        .find(|v| !v.is_empty())
        .map(str::to_owned)
}

fn nodes_from_script(html: &str) -> Vec<MeshNode> {
    let mut nodes = Vec::new();
    for re in SCRIPT_ARRAYS.iter() {
        let Some(array) = re.captures(html).and_then(|caps| caps.get(1)) else {
            continue;
        };
        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(array.as_str()) else {
            continue;
        };
        for item in &items {
            let Some(mac) = json_str(item, &["mac", "mac_address", "macAddress"]) else {
                continue;
            };
            let mut node = MeshNode::new(normalize_mac(&mac));
            node.name = json_str(item, &["name", "hostname"]);
            node.model = json_str(item, &["model", "device_model"]);
            node.firmware_version = json_str(item, &["firmware", "fw_version", "version"]);
            node.ip_address = json_str(item, &["ip", "ip_address"]);
            if json_str(item, &["status"]).is_some_and(|s| s.eq_ignore_ascii_case("offline")) {
                node.status = Some(NodeStatus::Offline);
            }
            nodes.push(node);
        }
    }
    nodes
}

/// Parse the concatenated mesh pages.
pub fn parse_mesh_devices(html: &str) -> MeshOverview {
    let mut overview = MeshOverview::default();
    if html.trim().is_empty() {
        debug!("no mesh pages to parse");
        return overview;
    }

    let fields = Fields::parse(html);
    if let Some(units) = fields.get("Mesh Units").and_then(|u| u.trim().parse::<usize>().ok()) {
        overview.mesh_count = units.saturating_sub(1);
    }
    overview.main_router_name = fields.get("Device Name").map(str::to_owned);

    let doc = Html::parse_document(html);
    let mut found: Vec<MeshNode> = doc
        .select(&PANELS)
        .filter_map(|panel| {
            let block = text_lines(panel);
            node_from_block(&block).or_else(|| node_from_panel(&block))
        })
        .collect();

    if found.is_empty() {
        found = doc.select(&ROWS).filter_map(node_from_row).collect();
    }
    if found.is_empty() {
        found = doc
            .select(&ID_DIVS)
            .filter(|div| div.value().attr("id").is_some_and(|id| NODE_DIV_ID.is_match(id)))
            .filter_map(|div| node_from_block(&text_lines(div)))
            .collect();
    }
    if found.is_empty() {
        found = nodes_from_script(html);
    }

    let mut seen = HashSet::new();
    for node in found {
        let name = node.name.as_deref().unwrap_or_default().to_lowercase();
        if MAIN_ROUTER_NAMES.contains(&name.as_str()) {
            continue;
        }
        if seen.insert(node.mac_address.clone()) {
            overview.devices.insert(node.mac_address.clone(), node);
        }
    }
    if !overview.devices.is_empty() {
        overview.mesh_count = overview.devices.len();
    }

    debug!(
        count = overview.mesh_count,
        nodes = ?overview.devices.keys().collect::<Vec<_>>(),
        "parsed mesh overview"
    );
    overview
}

/// Node detail from the `devstatus` fragment plus the `devlist` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshClientDetail {
    pub model: Option<String>,
    pub name: Option<String>,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub firmware_version: Option<String>,
    pub backhaul: Option<String>,
    pub connected_devices: usize,
    pub status: NodeStatus,
}

static TR: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static TR_WITH_ID: LazyLock<Selector> = LazyLock::new(|| selector("tr[id]"));
static CONTENT_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"cbi-table-\d+-content"));
static DATA_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"cbi-table-\d+-data"));
static TABLE_ROW_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"cbi-table-\d+"));

fn div_with_id<'a>(row: ElementRef<'a>, re: &Regex) -> Option<ElementRef<'a>> {
    row.select(&ID_DIVS)
        .find(|div| div.value().attr("id").is_some_and(|id| re.is_match(id)))
}

/// Returns `None` when neither page says anything about the node.
pub fn parse_mesh_client_status(devstatus: &str, devlist: Option<&str>) -> Option<MeshClientDetail> {
    if devstatus.trim().is_empty() {
        return None;
    }
    let mut detail = MeshClientDetail::default();

    let doc = Html::parse_document(devstatus);
    for row in doc.select(&TR) {
        let (Some(label), Some(value)) = (
            div_with_id(row, &CONTENT_ID),
            div_with_id(row, &DATA_ID),
        ) else {
            continue;
        };
        let value = text(value);
        match text(label).to_lowercase().as_str() {
            "model" => detail.model = Some(value),
            "device name" | "name" => detail.name = Some(value),
            "ip address" | "ip-address" | "ipaddress" => detail.ip_address = Some(value),
            "mac-address" | "mac address" | "macaddress" => {
                detail.mac_address = Some(value.to_uppercase());
            }
            "firmware version" | "firmware" => detail.firmware_version = Some(value),
            "backhaul" => detail.backhaul = Some(value),
            "status" => {
                let lower = value.to_lowercase();
                if lower.contains("online") {
                    detail.status = NodeStatus::Online;
                } else if lower.contains("offline") {
                    detail.status = NodeStatus::Offline;
                }
            }
            _ => {}
        }
    }

    if let Some(devlist) = devlist.filter(|d| !d.trim().is_empty()) {
        let doc = Html::parse_document(devlist);
        detail.connected_devices = doc
            .select(&TR_WITH_ID)
            .filter(|tr| tr.value().attr("id").is_some_and(|id| TABLE_ROW_ID.is_match(id)))
            .count();
    }

    let meaningful = detail.name.is_some()
        || detail.mac_address.is_some()
        || detail.model.is_some()
        || detail.connected_devices > 0;
    meaningful.then_some(detail)
}

/// `sysreport` block of a mesh client feed entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SysReport {
    pub hardware: Option<String>,
    pub board: Option<String>,
    pub model: Option<String>,
    pub firmware: Option<String>,
    pub ipaddr: Option<String>,
    pub ledstatus: Option<Value>,
}

/// One entry of `admin/network/mesh/clients?clients=all`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MeshClientEntry {
    /// 12 hex digits; [`MAIN_ROUTER_ID`] for the main router.
    #[serde(default)]
    pub id: String,
    pub name: Option<String>,
    pub state: Option<String>,
    #[serde(default)]
    pub sysreport: SysReport,
}

impl MeshClientEntry {
    pub fn mac_address(&self) -> String {
        format_compact_mac(&self.id)
    }

    pub fn is_main_router(&self) -> bool {
        self.id == MAIN_ROUTER_ID
    }

    pub fn led_status(&self) -> Option<String> {
        match self.sysreport.ledstatus.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Node record from the feed. The model is the first word of the
    /// hardware name (`RE1200 V1.0` reads as `RE1200`) when present.
    pub fn to_node(&self) -> MeshNode {
        let report = &self.sysreport;
        let hardware = report.hardware.clone().filter(|h| !h.is_empty());
        let model = hardware
            .as_deref()
            .and_then(|h| h.split(' ').next())
            .map(str::to_owned)
            .or_else(|| report.board.clone().filter(|b| !b.is_empty()))
            .or_else(|| report.model.clone());
        let status = if self.state.as_deref() == Some("connected") {
            NodeStatus::Online
        } else {
            NodeStatus::Offline
        };
        MeshNode {
            mac_address: self.mac_address(),
            name: self.name.clone().filter(|n| !n.is_empty()),
            model,
            hardware,
            firmware_version: report.firmware.clone(),
            ip_address: report.ipaddr.clone(),
            backhaul: None,
            status: Some(status),
            led_status: self.led_status(),
            connected_devices: None,
        }
    }
}

static JSON_ARRAY: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?s)\[.*\]"));

/// Decode the mesh client feed. A body without an array is an empty feed;
/// an array that is not valid JSON is a [`Error::Parse`].
pub fn parse_mesh_clients(body: &str) -> Result<Vec<MeshClientEntry>, Error> {
    let Some(array) = JSON_ARRAY.find(body) else {
        return Ok(Vec::new());
    };
    let items: Vec<Value> = serde_json::from_str(array.as_str()).map_err(|e| Error::Parse {
        page: "admin/network/mesh/clients".into(),
        message: e.to_string(),
    })?;
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<MeshClientEntry>(item).ok())
        .filter(|entry| !entry.id.is_empty())
        .collect())
}

static TAB_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"tab-([0-9A-Fa-f]{12})-"));
static CLIENT_PARAM: LazyLock<Regex> = LazyLock::new(|| pattern(r"client=([0-9A-Fa-f]{12})"));

/// Compact node ids referenced by tab ids and `client=` links.
pub fn extract_mesh_client_ids(html: &str) -> Vec<String> {
    TAB_ID
        .captures_iter(html)
        .chain(CLIENT_PARAM.captures_iter(html))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const OVERVIEW: &str = r#"
<table>
  <tr><td>Device Name</td><td>Home Router</td></tr>
  <tr><td>Mesh Units</td><td>2</td></tr>
</table>
<div class="panel">
  <div class="panel-heading">Satellite</div>
  <div class="panel-body">Name: Living Room<br/>MAC: 80:af:ca:11:22:33<br/>IP: 192.168.10.2<br/>Firmware: 2.1.4<br/>Status: Online</div>
</div>"#;

    #[test]
    fn overview_reads_main_router_and_satellites() {
        let overview = parse_mesh_devices(OVERVIEW);

        assert_eq!(overview.main_router_name.as_deref(), Some("Home Router"));
        assert_eq!(overview.mesh_count, 1);
        let node = &overview.devices["80:AF:CA:11:22:33"];
        assert_eq!(node.name.as_deref(), Some("Living Room"));
        assert_eq!(node.ip_address.as_deref(), Some("192.168.10.2"));
        assert_eq!(node.firmware_version.as_deref(), Some("2.1.4"));
        assert_eq!(node.status, Some(NodeStatus::Online));
    }

    #[test]
    fn unit_count_alone_excludes_main_router() {
        let html = "<table><tr><td>Mesh Units</td><td>3</td></tr></table>";
        let overview = parse_mesh_devices(html);
        assert_eq!(overview.mesh_count, 2);
        assert!(overview.devices.is_empty());
    }

    #[test]
    fn name_only_panel_gets_pseudo_mac() {
        let overview = parse_mesh_devices(r#"<div class="panel">Satellite</div>"#);
        assert_eq!(overview.devices.len(), 1);
        let node = overview.devices.values().next().expect("one node");
        assert_eq!(node.name.as_deref(), Some("Satellite"));
        assert_eq!(node.mac_address, pseudo_mac("Satellite"));
    }

    #[test]
    fn table_rows_are_a_fallback() {
        let html = "<table>\
            <tr><th>Name</th><th>MAC</th></tr>\
            <tr><td>Kitchen</td><td>aa-bb-cc-dd-ee-ff</td><td>192.168.10.3</td><td>M1800</td><td>1.2.3</td></tr>\
            <tr><td>Router</td><td>aa-bb-cc-dd-ee-00</td></tr>\
            </table>";
        let overview = parse_mesh_devices(html);
        assert_eq!(overview.mesh_count, 1);
        let node = &overview.devices["AA:BB:CC:DD:EE:FF"];
        assert_eq!(node.name.as_deref(), Some("Kitchen"));
        assert_eq!(node.model.as_deref(), Some("M1800"));
        assert_eq!(node.firmware_version.as_deref(), Some("1.2.3"));
        assert_eq!(node.ip_address.as_deref(), Some("192.168.10.3"));
    }

    #[test]
    fn script_array_is_the_last_resort() {
        let html = r#"<script>var meshNodes = [{"mac":"aa:bb:cc:00:00:09","name":"Garage","model":"RE1200","ip":"192.168.10.9","status":"offline"}];</script>"#;
        let overview = parse_mesh_devices(html);
        let node = &overview.devices["AA:BB:CC:00:00:09"];
        assert_eq!(node.name.as_deref(), Some("Garage"));
        assert_eq!(node.status, Some(NodeStatus::Offline));
    }

    #[test]
    fn empty_mesh_page_is_empty_overview() {
        assert_eq!(parse_mesh_devices(""), MeshOverview::default());
    }

    #[test]
    fn client_detail_reads_labelled_rows_and_counts_devices() {
        let devstatus = r#"<table>
            <tr><td><div id="cbi-table-1-content">Model</div></td><td><div id="cbi-table-1-data">RE1200</div></td></tr>
            <tr><td><div id="cbi-table-2-content">MAC-Address</div></td><td><div id="cbi-table-2-data">80:af:ca:11:22:33</div></td></tr>
            <tr><td><div id="cbi-table-3-content">Backhaul</div></td><td><div id="cbi-table-3-data">5G Wireless</div></td></tr>
            <tr><td><div id="cbi-table-4-content">Status</div></td><td><div id="cbi-table-4-data">Offline</div></td></tr>
        </table>"#;
        let devlist = r#"<table><tr><th>Host</th></tr><tr id="cbi-table-1"><td>a</td></tr><tr id="cbi-table-2"><td>b</td></tr></table>"#;

        let detail = parse_mesh_client_status(devstatus, Some(devlist)).expect("detail");
        assert_eq!(detail.model.as_deref(), Some("RE1200"));
        assert_eq!(detail.mac_address.as_deref(), Some("80:AF:CA:11:22:33"));
        assert_eq!(detail.backhaul.as_deref(), Some("5G Wireless"));
        assert_eq!(detail.status, NodeStatus::Offline);
        assert_eq!(detail.connected_devices, 2);
    }

    #[test]
    fn client_detail_without_data_is_none() {
        assert_eq!(parse_mesh_client_status("", None), None);
        assert_eq!(parse_mesh_client_status("<p>loading</p>", None), None);
    }

    #[test]
    fn client_feed_decodes_entries() {
        let body = r#"callback([
            {"id":"000000000000","name":"Main","state":"connected","sysreport":{"ledstatus":"on"}},
            {"id":"80afca112233","name":"Living Room","state":"connected",
             "sysreport":{"hardware":"RE1200 V1.0","firmware":"2.1.4","ipaddr":"192.168.10.2","ledstatus":1}},
            {"name":"no id"},
            "junk"
        ])"#;
        let entries = parse_mesh_clients(body).expect("valid feed");
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_main_router());
        assert_eq!(entries[0].led_status().as_deref(), Some("on"));

        let node = entries[1].to_node();
        assert_eq!(node.mac_address, "80:AF:CA:11:22:33");
        assert_eq!(node.model.as_deref(), Some("RE1200"));
        assert_eq!(node.led_status.as_deref(), Some("1"));
        assert_eq!(node.status, Some(NodeStatus::Online));
    }

    #[test]
    fn malformed_feed_is_a_parse_error() {
        assert!(matches!(parse_mesh_clients("[{oops]"), Err(Error::Parse { .. })));
        assert!(parse_mesh_clients("no clients").expect("empty feed").is_empty());
    }

    #[test]
    fn detail_fills_gaps_and_sets_device_count() {
        let mut node = MeshNode {
            mac_address: "80:AF:CA:11:22:33".into(),
            name: Some("Living Room".into()),
            model: Some("Unknown".into()),
            ..MeshNode::default()
        };
        node.merge_detail(MeshClientDetail {
            name: Some("Satellite".into()),
            model: Some("RE1200".into()),
            connected_devices: 4,
            status: NodeStatus::Offline,
            ..MeshClientDetail::default()
        });
        assert_eq!(node.name.as_deref(), Some("Living Room"));
        assert_eq!(node.model.as_deref(), Some("RE1200"));
        assert_eq!(node.connected_devices, Some(4));
        assert_eq!(node.status, Some(NodeStatus::Offline));
    }

    #[test]
    fn client_ids_come_from_tabs_and_links() {
        let html = r#"<li id="tab-80afca112233-status"></li><a href="?client=80AFCA445566">x</a>"#;
        assert_eq!(extract_mesh_client_ids(html), ["80afca112233", "80AFCA445566"]);
    }
}
