// ── Poll collector ──
//
// One poll walks the enabled modules in a fixed order, fetches each
// module's pages through the shared session, and hands the bodies to the
// pure parsers in cudy-api. Pages fetched with `silent = true` are
// optional: when they fail the module still gets a record with those
// fields absent.

use std::collections::HashSet;
use std::time::Duration;

use cudy_api::LuciClient;
use cudy_api::parse::{
    MAIN_ROUTER_ID, MeshClientEntry, MeshNode, MeshOverview, extract_mesh_client_ids,
    format_compact_mac, looks_like_wan_page, parse_data_usage, parse_devices, parse_devices_status,
    parse_dhcp_status, parse_lan_status, parse_mesh_client_status, parse_mesh_clients,
    parse_mesh_devices, parse_modem_info, parse_sms_status, parse_system_status, parse_vpn_status,
    parse_wan_status, parse_wifi_status, pseudo_mac,
};
use tracing::{debug, info};

use crate::config::RouterConfig;
use crate::error::CoreError;
use crate::model::{DevicesData, Module, RouterData};

/// Wall-clock budget for one whole poll.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(30);

// ── Page paths (below /cgi-bin/luci/) ────────────────────────────────

const MODEM_STATUS: &str = "admin/network/gcom/status";
const MODEM_DETAIL: &str = "admin/network/gcom/status?detail=1&iface=4g";
const DEVICE_LIST: &str = "admin/network/devices/devlist?detail=1";
const DEVICE_STATUS: &str = "admin/network/devices/status?detail=1";
const PANEL: &str = "admin/panel";
const SYSTEM_STATUS: &str = "admin/system/status";
const STATUS_OVERVIEW: &str = "admin/status/overview";
const SYSTEM_PAGE: &str = "admin/system/system";
const DATA_USAGE: &str = "admin/network/gcom/statistics?iface=4g";
const SMS_STATUS: &str = "admin/network/gcom/sms/status";
const WIFI_2G: &str = "admin/network/wireless/status?iface=wlan00";
const WIFI_5G: &str = "admin/network/wireless/status?iface=wlan10";
const LAN_STATUS: &str = "admin/network/lan/status";
const VPN_STATUS: &str = "admin/network/vpn/openvpns/status?status=";
const WAN_STATUS: &str = "admin/network/wan/status?detail=1&iface=wan";
const DHCP_STATUS: &str = "admin/services/dhcp/status?detail=1";
const MESH_CLIENTS: &str = "admin/network/mesh/clients?clients=all";

/// Pages that may describe the mesh, depending on firmware.
const MESH_PAGES: &[&str] = &[
    "admin/network/mesh/status",
    "admin/network/mesh",
    "admin/network/mesh/topology",
    "admin/network/mesh/nodes",
    "admin/easymesh/status",
    "admin/easymesh",
];

const MESH_MARKERS: &[&str] = &["mesh", "node", "satellite"];

/// Run one poll under [`POLL_TIMEOUT`].
///
/// Authentication failures fail the whole poll and the caller keeps the
/// previous snapshot. A page that never answers leaves its fields absent.
pub async fn collect_router_data(
    client: &LuciClient,
    config: &RouterConfig,
) -> Result<RouterData, CoreError> {
    match tokio::time::timeout(POLL_TIMEOUT, collect(client, config)).await {
        Ok(result) => result.map_err(CoreError::from),
        Err(_) => Err(CoreError::Timeout {
            timeout_secs: POLL_TIMEOUT.as_secs(),
        }),
    }
}

async fn collect(client: &LuciClient, config: &RouterConfig) -> Result<RouterData, cudy_api::Error> {
    client.ensure_valid().await?;
    let mut data = RouterData::default();

    if config.polls(Module::Modem) {
        let status = client.get(MODEM_STATUS, false).await?;
        let detail = client.get(MODEM_DETAIL, false).await?;
        data.modem = Some(parse_modem_info(&format!("{status}{detail}")));
    }

    if config.polls(Module::Devices) {
        let list = client.get(DEVICE_LIST, false).await?;
        let info = parse_devices(&list, &config.device_list);

        let mut status = client.get(DEVICE_STATUS, false).await?;
        if !status.to_lowercase().contains("client") {
            status.push_str(&client.get(PANEL, false).await?);
        }
        data.devices = Some(DevicesData {
            info,
            clients: parse_devices_status(&status),
        });
    }

    if config.polls(Module::System) {
        let mut html = client.get(SYSTEM_STATUS, false).await?;
        html.push_str(&client.get(PANEL, false).await?);
        html.push_str(&client.get(STATUS_OVERVIEW, true).await?);
        html.push_str(&client.get(SYSTEM_PAGE, true).await?);
        data.system = Some(parse_system_status(&html));
    }

    if config.polls(Module::DataUsage) {
        data.data_usage = Some(parse_data_usage(&client.get(DATA_USAGE, false).await?));
    }

    if config.polls(Module::Sms) {
        data.sms = Some(parse_sms_status(&client.get(SMS_STATUS, false).await?));
    }

    if config.polls(Module::Wifi2g) {
        data.wifi_2g = Some(parse_wifi_status(&client.get(WIFI_2G, false).await?));
    }

    if config.polls(Module::Wifi5g) {
        data.wifi_5g = Some(parse_wifi_status(&client.get(WIFI_5G, false).await?));
    }

    if config.polls(Module::Lan) {
        data.lan = Some(parse_lan_status(&client.get(LAN_STATUS, false).await?));
    }

    if config.polls(Module::Vpn) {
        data.vpn = Some(parse_vpn_status(&client.get(VPN_STATUS, false).await?));
    }

    if config.polls(Module::Wan) {
        // Some models answer with a generic page; keep WAN only when it is real.
        let html = client.get(WAN_STATUS, true).await?;
        if looks_like_wan_page(&html) {
            let wan = parse_wan_status(&html);
            if wan.has_values() {
                data.wan = Some(wan);
            }
        }
    }

    if config.polls(Module::Dhcp) {
        data.dhcp = Some(parse_dhcp_status(&client.get(DHCP_STATUS, false).await?));
    }

    if config.polls(Module::Mesh) {
        data.mesh = Some(collect_mesh(client).await?);
    }

    Ok(data)
}

/// Build the mesh overview from the topology pages, the client feed, and
/// each satellite's status fragments.
async fn collect_mesh(client: &LuciClient) -> Result<MeshOverview, cudy_api::Error> {
    let mut mesh_html = String::new();
    for page in MESH_PAGES {
        let body = client.get(page, true).await?;
        let lower = body.to_lowercase();
        if MESH_MARKERS.iter().any(|marker| lower.contains(marker)) {
            debug!(page, len = body.len(), "found mesh data");
            mesh_html.push_str(&body);
        }
    }
    let mut overview = parse_mesh_devices(&mesh_html);

    let feed_body = client.get(MESH_CLIENTS, true).await?;
    let feed = parse_mesh_clients(&feed_body).unwrap_or_else(|e| {
        debug!(error = %e, "ignoring unreadable mesh client feed");
        Vec::new()
    });

    for id in node_ids(&feed, &mesh_html) {
        if id == MAIN_ROUTER_ID {
            if let Some(main) = feed.iter().find(|entry| entry.is_main_router()) {
                overview.main_router_led_status = main.led_status();
            }
            continue;
        }

        let mac = format_compact_mac(&id);
        let mut node = feed
            .iter()
            .find(|entry| entry.id.eq_ignore_ascii_case(&id))
            .map_or_else(MeshNode::default, MeshClientEntry::to_node);

        let devstatus = client
            .get(&format!("admin/network/mesh/client/devstatus?embedded=&client={id}"), true)
            .await?;
        let devlist = client
            .get(&format!("admin/network/mesh/client/devlist?embedded=&client={id}"), true)
            .await?;
        if let Some(detail) = parse_mesh_client_status(&devstatus, Some(devlist.as_str())) {
            node.merge_detail(detail);
        }

        if node.name.as_deref().is_none_or(str::is_empty) {
            let suffix = id.get(6..).unwrap_or(&id);
            node.name = Some(format!("Mesh Device {suffix}"));
        }
        node.mac_address.clone_from(&mac);
        info!(
            mac = %mac,
            name = node.name.as_deref().unwrap_or_default(),
            model = node.model.as_deref().unwrap_or_default(),
            connected = node.connected_devices.unwrap_or_default(),
            "mesh node"
        );
        merge_node(&mut overview, node);
    }

    overview.mesh_count = overview.devices.len();
    Ok(overview)
}

/// Feed ids first, then ids linked from the topology pages. Duplicates and
/// anything that is not 12 hex digits are dropped.
fn node_ids(feed: &[MeshClientEntry], mesh_html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    feed.iter()
        .map(|entry| entry.id.clone())
        .chain(extract_mesh_client_ids(mesh_html))
        .filter(|id| id.len() == 12 && id.chars().all(|c| c.is_ascii_hexdigit()))
        .filter(|id| seen.insert(id.to_ascii_uppercase()))
        .collect()
}

/// Fold a satellite into the overview: same MAC updates in place, a node the
/// overview only knew by name (keyed by its name-derived MAC) is replaced.
fn merge_node(overview: &mut MeshOverview, node: MeshNode) {
    if let Some(existing) = overview.devices.get_mut(&node.mac_address) {
        existing.update_from(node);
        return;
    }

    let placeholder = node.name.as_deref().and_then(|name| {
        overview
            .devices
            .iter()
            .find(|(key, known)| {
                known
                    .name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(name) && **key == pseudo_mac(n))
            })
            .map(|(key, _)| key.clone())
    });
    if let Some(key) = placeholder {
        debug!(placeholder = %key, mac = %node.mac_address, "replacing name-keyed mesh node");
        overview.devices.remove(&key);
    }
    overview.devices.insert(node.mac_address.clone(), node);
}
