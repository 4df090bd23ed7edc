// ── Router snapshot ──
//
// `RouterData` holds one typed record per polled module; a module that was
// not polled (disabled or gated) is `None`. `Snapshot` wraps the data with
// poll bookkeeping and is replaced wholesale after every poll.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cudy_api::parse::{
    ClientCounts, ConnectedDevice, DataUsage, DevicesInfo, DhcpStatus, LanStatus, MeshNode,
    MeshOverview, ModemInfo, SmsStatus, SystemStatus, VpnStatus, WanStatus, WifiStatus,
};
use serde::{Deserialize, Serialize};

use super::{Module, Reading};

/// Device list plus the client-count summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevicesData {
    #[serde(flatten)]
    pub info: DevicesInfo,
    #[serde(flatten)]
    pub clients: ClientCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modem: Option<ModemInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devices: Option<DevicesData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_usage: Option<DataUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms: Option<SmsStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wifi_2g: Option<WifiStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wifi_5g: Option<WifiStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lan: Option<LanStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshOverview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpn: Option<VpnStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wan: Option<WanStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp: Option<DhcpStatus>,
}

fn text(value: Option<&String>) -> Option<Reading> {
    value.map(|v| Reading::Text(v.clone()))
}

fn num<T: Into<Reading> + Copy>(value: Option<T>) -> Option<Reading> {
    value.map(Into::into)
}

impl RouterData {
    /// Whether `module` produced a record in this poll.
    pub fn has(&self, module: Module) -> bool {
        match module {
            Module::Modem => self.modem.is_some(),
            Module::Devices => self.devices.is_some(),
            Module::System => self.system.is_some(),
            Module::DataUsage => self.data_usage.is_some(),
            Module::Sms => self.sms.is_some(),
            Module::Wifi2g => self.wifi_2g.is_some(),
            Module::Wifi5g => self.wifi_5g.is_some(),
            Module::Lan => self.lan.is_some(),
            Module::Mesh => self.mesh.is_some(),
            Module::Vpn => self.vpn.is_some(),
            Module::Wan => self.wan.is_some(),
            Module::Dhcp => self.dhcp.is_some(),
        }
    }

    /// JSON view of one module's record.
    pub fn module_json(&self, module: Module) -> Option<serde_json::Value> {
        let value = serde_json::to_value(self).ok()?;
        value.get(module.as_str()).cloned()
    }

    /// Current value of `module`/`key`. Unknown keys and absent fields are `None`.
    #[allow(clippy::too_many_lines)]
    pub fn reading(&self, module: Module, key: &str) -> Option<Reading> {
        match module {
            Module::Modem => {
                let m = self.modem.as_ref()?;
                match key {
                    "signal" => num(m.signal),
                    "network" => text(m.network.as_ref()),
                    "sim" => text(m.sim.as_ref()),
                    "connected_time" => num(m.connected_time),
                    "cell" => text(m.cell.raw.as_ref()),
                    "rsrp" => num(m.rsrp),
                    "rsrq" => num(m.rsrq),
                    "sinr" => num(m.sinr),
                    "rssi" => num(m.rssi),
                    "band" => text(m.band.as_ref()),
                    "public_ip" => text(m.public_ip.as_ref()),
                    "wan_ip" => text(m.wan_ip.as_ref()),
                    "imei" => text(m.imei.as_ref()),
                    "imsi" => text(m.imsi.as_ref()),
                    "iccid" => text(m.iccid.as_ref()),
                    "mode" => text(m.mode.as_ref()),
                    "bandwidth" => text(m.bandwidth.as_ref()),
                    "session_upload" => num(m.session_upload),
                    "session_download" => num(m.session_download),
                    _ => None,
                }
            }
            Module::Devices => {
                let d = self.devices.as_ref()?;
                let down = d.info.top_downloader.as_ref();
                let up = d.info.top_uploader.as_ref();
                match key {
                    "device_count" => num(Some(d.info.device_count)),
                    "top_downloader_speed" => num(down.and_then(|c| c.down_speed)),
                    "top_downloader_mac" => text(down.and_then(|c| c.mac.as_ref())),
                    "top_downloader_hostname" => text(down.and_then(|c| c.hostname.as_ref())),
                    "top_uploader_speed" => num(up.and_then(|c| c.up_speed)),
                    "top_uploader_mac" => text(up.and_then(|c| c.mac.as_ref())),
                    "top_uploader_hostname" => text(up.and_then(|c| c.hostname.as_ref())),
                    "total_down_speed" => num(d.info.total_down_speed),
                    "total_up_speed" => num(d.info.total_up_speed),
                    "wifi_2g_clients" => num(d.clients.wifi_2g),
                    "wifi_5g_clients" => num(d.clients.wifi_5g),
                    "wired_clients" => num(d.clients.wired),
                    "total_clients" => num(d.clients.total),
                    _ => None,
                }
            }
            Module::System => {
                let s = self.system.as_ref()?;
                match key {
                    "uptime" => num(s.uptime),
                    "local_time" => text(s.local_time.as_ref()),
                    "firmware_version" => text(s.firmware_version.as_ref()),
                    _ => None,
                }
            }
            Module::DataUsage => {
                let u = self.data_usage.as_ref()?;
                match key {
                    "current_traffic" => num(u.current_traffic),
                    "monthly_traffic" => num(u.monthly_traffic),
                    "total_traffic" => num(u.total_traffic),
                    _ => None,
                }
            }
            Module::Sms => {
                let s = self.sms.as_ref()?;
                match key {
                    "inbox_count" => num(s.inbox_count),
                    "outbox_count" => num(s.outbox_count),
                    "unread_count" => num(s.unread_count),
                    _ => None,
                }
            }
            Module::Wifi2g | Module::Wifi5g => {
                let w = if module == Module::Wifi2g {
                    self.wifi_2g.as_ref()
                } else {
                    self.wifi_5g.as_ref()
                }?;
                match key {
                    "ssid" => text(w.ssid.as_ref()),
                    "channel" => num(w.channel),
                    "enabled" => num(w.enabled),
                    _ => None,
                }
            }
            Module::Lan => {
                let l = self.lan.as_ref()?;
                match key {
                    "ip_address" => text(l.ip_address.as_ref()),
                    "mac_address" => text(l.mac_address.as_ref()),
                    _ => None,
                }
            }
            Module::Mesh => {
                let m = self.mesh.as_ref()?;
                match key {
                    "mesh_count" => num(Some(m.mesh_count)),
                    "main_router_name" => text(m.main_router_name.as_ref()),
                    _ => None,
                }
            }
            Module::Vpn => {
                let v = self.vpn.as_ref()?;
                match key {
                    "protocol" => text(v.protocol.as_ref()),
                    "vpn_clients" => text(v.clients.as_ref()),
                    _ => None,
                }
            }
            Module::Wan => {
                let w = self.wan.as_ref()?;
                match key {
                    "protocol" => text(w.protocol.as_ref()),
                    "connected_time" => num(w.connected_time),
                    "mac_address" => text(w.mac_address.as_ref()),
                    "public_ip" => text(w.public_ip.as_ref()),
                    "wan_ip" => text(w.wan_ip.as_ref()),
                    "subnet_mask" => text(w.subnet_mask.as_ref()),
                    "gateway" => text(w.gateway.as_ref()),
                    "dns" => text(w.dns.as_ref()),
                    "session_upload" => num(w.session_upload),
                    "session_download" => num(w.session_download),
                    _ => None,
                }
            }
            Module::Dhcp => {
                let d = self.dhcp.as_ref()?;
                match key {
                    "dhcp_ip_start" => text(d.ip_start.as_ref()),
                    "dhcp_ip_end" => text(d.ip_end.as_ref()),
                    "dhcp_prefered_dns" => text(d.preferred_dns.as_ref()),
                    "dhcp_default_gateway" => text(d.default_gateway.as_ref()),
                    "dhcp_leasetime" => text(d.lease_time.as_ref()),
                    _ => None,
                }
            }
        }
    }

    /// Extra state attributes shown next to a few sensors.
    pub fn attributes(&self, module: Module, key: &str) -> BTreeMap<&'static str, Reading> {
        let mut attrs = BTreeMap::new();
        let mut put = |name: &'static str, value: Option<Reading>| {
            if let Some(value) = value {
                attrs.insert(name, value);
            }
        };
        match (module, key) {
            (Module::Modem, "network") => {
                if let Some(m) = &self.modem {
                    put("mcc", text(m.mcc.as_ref()));
                    put("mnc", text(m.mnc.as_ref()));
                }
            }
            (Module::Modem, "band") => {
                if let Some(m) = &self.modem {
                    put("pcc", text(m.bands.pcc.as_ref()));
                    put("scc1", text(m.bands.scc1.as_ref()));
                    put("scc2", text(m.bands.scc2.as_ref()));
                    put("scc3", text(m.bands.scc3.as_ref()));
                    put("scc4", text(m.bands.scc4.as_ref()));
                }
            }
            (Module::Modem, "cell") => {
                if let Some(m) = &self.modem {
                    put("id", num(m.cell.id));
                    put("enb", num(m.cell.enb));
                    put("sector", num(m.cell.sector));
                    put("pcid", num(m.cell.pcid));
                }
            }
            (Module::Devices, "top_downloader_speed" | "top_uploader_speed") => {
                let top = self.devices.as_ref().and_then(|d| {
                    if key == "top_downloader_speed" {
                        d.info.top_downloader.as_ref()
                    } else {
                        d.info.top_uploader.as_ref()
                    }
                });
                if let Some(device) = top {
                    put("hostname", text(device.hostname.as_ref()));
                    put("mac", text(device.mac.as_ref()));
                    put("ip", text(device.ip.as_ref()));
                }
            }
            _ => {}
        }
        attrs
    }

    /// A device from the tracked `device_list`, by the MAC or hostname it was listed under.
    pub fn tracked_device(&self, id: &str) -> Option<&ConnectedDevice> {
        self.devices.as_ref()?.info.detailed.get(id)
    }

    pub fn mesh_node(&self, mac: &str) -> Option<&MeshNode> {
        self.mesh.as_ref()?.devices.get(mac)
    }

    pub fn mesh_nodes(&self) -> impl Iterator<Item = &MeshNode> {
        self.mesh.iter().flat_map(|m| m.devices.values())
    }
}

/// Point-in-time view published after each poll.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub data: RouterData,
    /// `false` after a failed poll. `data` then holds the last good values.
    pub available: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Successful polls since the controller connected.
    pub poll_count: u64,
}

impl Snapshot {
    pub(crate) fn fresh(data: RouterData, poll_count: u64) -> Self {
        Self {
            data,
            available: true,
            updated_at: Some(Utc::now()),
            last_error: None,
            poll_count,
        }
    }

    /// Keep the previous values but flag them stale.
    pub(crate) fn failed(previous: &Self, error: String) -> Self {
        Self {
            data: previous.data.clone(),
            available: false,
            updated_at: previous.updated_at,
            last_error: Some(error),
            poll_count: previous.poll_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RouterData {
        RouterData {
            modem: Some(ModemInfo {
                network: Some("5G-SA".into()),
                mcc: Some("001".into()),
                rssi: Some(-60),
                signal: Some(3),
                ..ModemInfo::default()
            }),
            devices: Some(DevicesData {
                info: DevicesInfo {
                    device_count: 2,
                    ..DevicesInfo::default()
                },
                clients: ClientCounts {
                    wired: Some(0),
                    ..ClientCounts::default()
                },
            }),
            ..RouterData::default()
        }
    }

    #[test]
    fn readings_resolve_by_module_and_key() {
        let data = sample();
        assert_eq!(data.reading(Module::Modem, "rssi"), Some(Reading::Int(-60)));
        assert_eq!(data.reading(Module::Modem, "band"), None);
        assert_eq!(data.reading(Module::Devices, "device_count"), Some(Reading::Int(2)));
        assert_eq!(data.reading(Module::Devices, "wired_clients"), Some(Reading::Int(0)));
        assert_eq!(data.reading(Module::System, "uptime"), None);
        assert_eq!(data.reading(Module::Modem, "nonsense"), None);
    }

    #[test]
    fn network_carries_operator_codes() {
        let attrs = sample().attributes(Module::Modem, "network");
        assert_eq!(attrs.get("mcc"), Some(&Reading::from("001")));
        assert!(!attrs.contains_key("mnc"));
    }

    #[test]
    fn module_json_skips_unpolled_modules() {
        let data = sample();
        assert!(data.module_json(Module::Modem).is_some());
        assert!(data.module_json(Module::Wan).is_none());
        let devices = data.module_json(Module::Devices).expect("devices");
        assert_eq!(devices["device_count"], 2);
        assert_eq!(devices["wired"], 0);
    }

    #[test]
    fn failed_snapshot_keeps_last_values() {
        let good = Snapshot::fresh(sample(), 4);
        let bad = Snapshot::failed(&good, "timeout".into());
        assert!(!bad.available);
        assert_eq!(bad.poll_count, 4);
        assert_eq!(bad.data, good.data);
        assert_eq!(bad.last_error.as_deref(), Some("timeout"));
    }
}
