// ── Entity adapters ──
//
// Maps a snapshot onto named sensors, switches, and buttons with stable
// unique ids, the shape a home-automation host (or the CLI) consumes.
// Sensor metadata lives in a static description table keyed by
// `(module, key)`.

use std::collections::BTreeMap;

use cudy_api::parse::MeshNode;
use serde::Serialize;

use crate::command::Command;
use crate::config::RouterConfig;
use crate::features::existing_feature;
use crate::model::{Module, Reading, Snapshot};

use Module::{DataUsage, Devices, Dhcp, Lan, Mesh, Modem, Sms, System, Vpn, Wan, Wifi2g, Wifi5g};

/// Device name used when the mesh overview does not name the main router.
pub const DEFAULT_ROUTER_NAME: &str = "Cudy Router";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Duration,
    SignalStrength,
    DataRate,
    DataSize,
    Enum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
    TotalIncreasing,
}

/// Static metadata for one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorDescription {
    pub module: Module,
    pub key: &'static str,
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
    pub icon: Option<&'static str>,
}

impl SensorDescription {
    const fn new(module: Module, key: &'static str, name: &'static str) -> Self {
        Self {
            module,
            key,
            name,
            unit: None,
            device_class: None,
            state_class: None,
            icon: None,
        }
    }

    const fn icon(mut self, icon: &'static str) -> Self {
        self.icon = Some(icon);
        self
    }

    const fn measurement(mut self) -> Self {
        self.state_class = Some(StateClass::Measurement);
        self
    }

    const fn class(mut self, class: DeviceClass) -> Self {
        self.device_class = Some(class);
        self
    }

    const fn seconds(mut self) -> Self {
        self.unit = Some("s");
        self.device_class = Some(DeviceClass::Duration);
        self.state_class = Some(StateClass::Measurement);
        self
    }

    const fn dbm(mut self) -> Self {
        self.unit = Some("dBm");
        self.device_class = Some(DeviceClass::SignalStrength);
        self.state_class = Some(StateClass::Measurement);
        self
    }

    const fn db(mut self) -> Self {
        self.unit = Some("dB");
        self.device_class = Some(DeviceClass::SignalStrength);
        self.state_class = Some(StateClass::Measurement);
        self
    }

    const fn mbits(mut self) -> Self {
        self.unit = Some("Mbit/s");
        self.device_class = Some(DeviceClass::DataRate);
        self.state_class = Some(StateClass::Measurement);
        self
    }

    const fn megabytes(mut self) -> Self {
        self.unit = Some("MB");
        self.device_class = Some(DeviceClass::DataSize);
        self.state_class = Some(StateClass::TotalIncreasing);
        self
    }
}

/// Module sensors, created when their module was polled.
pub static SENSORS: &[SensorDescription] = &[
    SensorDescription::new(Modem, "sim", "SIM slot").class(DeviceClass::Enum),
    SensorDescription::new(Modem, "connected_time", "Connected time").seconds(),
    SensorDescription::new(Modem, "cell", "Cell information"),
    SensorDescription::new(Modem, "rsrp", "RSRP").dbm(),
    SensorDescription::new(Modem, "rsrq", "RSRQ").db(),
    SensorDescription::new(Modem, "sinr", "SINR").db(),
    SensorDescription::new(Modem, "rssi", "RSSI").dbm(),
    SensorDescription::new(Modem, "band", "Band"),
    SensorDescription::new(Modem, "public_ip", "Public IP"),
    SensorDescription::new(Modem, "wan_ip", "WAN IP"),
    SensorDescription::new(Modem, "imei", "IMEI"),
    SensorDescription::new(Modem, "imsi", "IMSI"),
    SensorDescription::new(Modem, "iccid", "ICCID"),
    SensorDescription::new(Modem, "mode", "Mode"),
    SensorDescription::new(Modem, "bandwidth", "Bandwidth"),
    SensorDescription::new(Modem, "session_upload", "Session upload").megabytes(),
    SensorDescription::new(Modem, "session_download", "Session download").megabytes(),
    SensorDescription::new(Devices, "device_count", "Device count").measurement(),
    SensorDescription::new(Devices, "top_downloader_speed", "Top downloader speed")
        .mbits()
        .icon("mdi:star-check"),
    SensorDescription::new(Devices, "top_downloader_mac", "Top downloader MAC")
        .icon("mdi:star-check"),
    SensorDescription::new(Devices, "top_downloader_hostname", "Top downloader hostname")
        .icon("mdi:star-check"),
    SensorDescription::new(Devices, "top_uploader_speed", "Top uploader speed")
        .mbits()
        .icon("mdi:star-check-outline"),
    SensorDescription::new(Devices, "top_uploader_mac", "Top uploader MAC")
        .icon("mdi:star-check-outline"),
    SensorDescription::new(Devices, "top_uploader_hostname", "Top uploader hostname")
        .icon("mdi:star-check-outline"),
    SensorDescription::new(Devices, "total_down_speed", "Total download speed").mbits(),
    SensorDescription::new(Devices, "total_up_speed", "Total upload speed").mbits(),
    SensorDescription::new(Devices, "wifi_2g_clients", "WiFi 2.4G clients")
        .measurement()
        .icon("mdi:account"),
    SensorDescription::new(Devices, "wifi_5g_clients", "WiFi 5G clients")
        .measurement()
        .icon("mdi:account"),
    SensorDescription::new(Devices, "wired_clients", "Wired clients")
        .measurement()
        .icon("mdi:account"),
    SensorDescription::new(Devices, "total_clients", "Total clients")
        .measurement()
        .icon("mdi:account-group"),
    SensorDescription::new(Wan, "protocol", "Protocol").icon("mdi:protocol"),
    SensorDescription::new(Wan, "connected_time", "Connected time").seconds(),
    SensorDescription::new(Wan, "mac_address", "WAN MAC").icon("mdi:wan"),
    SensorDescription::new(Wan, "public_ip", "Public IP").icon("mdi:ip"),
    SensorDescription::new(Wan, "wan_ip", "WAN IP").icon("mdi:ip"),
    SensorDescription::new(Wan, "subnet_mask", "Subnet mask").icon("mdi:ip"),
    SensorDescription::new(Wan, "gateway", "Gateway").icon("mdi:router-network"),
    SensorDescription::new(Wan, "dns", "DNS").icon("mdi:dns"),
    SensorDescription::new(Wan, "session_upload", "Session upload").megabytes(),
    SensorDescription::new(Wan, "session_download", "Session download").megabytes(),
    SensorDescription::new(System, "uptime", "Uptime").seconds(),
    SensorDescription::new(System, "local_time", "Local time").icon("mdi:clock"),
    SensorDescription::new(System, "firmware_version", "Firmware version").icon("mdi:label"),
    SensorDescription::new(DataUsage, "current_traffic", "Current session traffic").megabytes(),
    SensorDescription::new(DataUsage, "monthly_traffic", "Monthly traffic").megabytes(),
    SensorDescription::new(DataUsage, "total_traffic", "Total traffic").megabytes(),
    SensorDescription::new(Sms, "inbox_count", "SMS inbox").measurement(),
    SensorDescription::new(Sms, "outbox_count", "SMS outbox").measurement(),
    SensorDescription::new(Sms, "unread_count", "SMS unread").measurement(),
    SensorDescription::new(Wifi2g, "ssid", "WiFi 2.4G SSID").icon("mdi:wifi"),
    SensorDescription::new(Wifi2g, "channel", "WiFi 2.4G channel")
        .measurement()
        .icon("mdi:wifi"),
    SensorDescription::new(Wifi5g, "ssid", "WiFi 5G SSID").icon("mdi:wifi"),
    SensorDescription::new(Wifi5g, "channel", "WiFi 5G channel")
        .measurement()
        .icon("mdi:wifi"),
    SensorDescription::new(Lan, "ip_address", "LAN IP").icon("mdi:ip"),
    SensorDescription::new(Lan, "mac_address", "LAN MAC").icon("mdi:lan"),
    SensorDescription::new(Mesh, "mesh_count", "Mesh devices")
        .measurement()
        .icon("mdi:table-network"),
    SensorDescription::new(Vpn, "protocol", "VPN protocol").icon("mdi:protocol"),
    SensorDescription::new(Vpn, "vpn_clients", "VPN clients").icon("mdi:account-star"),
    SensorDescription::new(Dhcp, "dhcp_ip_start", "IP Start").icon("mdi:ip"),
    SensorDescription::new(Dhcp, "dhcp_ip_end", "IP End").icon("mdi:ip"),
    SensorDescription::new(Dhcp, "dhcp_prefered_dns", "Preferred DNS").icon("mdi:dns"),
    SensorDescription::new(Dhcp, "dhcp_default_gateway", "Default Gateway")
        .icon("mdi:router-network"),
    SensorDescription::new(Dhcp, "dhcp_leasetime", "Leasetime").icon("mdi:timer"),
];

/// Signal and network sensors, created whenever the model supports them.
pub static SIGNAL_SENSORS: &[SensorDescription] = &[
    SensorDescription::new(Modem, "signal", "Signal strength").measurement(),
    SensorDescription::new(Modem, "network", "Network"),
];

/// Sensors created for each entry of the tracked device list.
const DEVICE_SENSORS: &[(&str, &str, Option<&str>)] = &[
    ("mac", "MAC", None),
    ("hostname", "Hostname", None),
    ("up_speed", "Upload speed", Some("Mbit/s")),
    ("down_speed", "Download speed", Some("Mbit/s")),
];

/// Sensors created for each mesh node.
const MESH_SENSORS: &[(&str, &str, Option<&str>)] = &[
    ("name", "Name", Some("mdi:router-wireless")),
    ("model", "Model", Some("mdi:information")),
    ("mac_address", "MAC address", Some("mdi:lan")),
    ("firmware_version", "Firmware", Some("mdi:chip")),
    ("status", "Status", Some("mdi:check-network")),
    ("ip_address", "IP address", Some("mdi:ip")),
    ("connected_devices", "Connected devices", Some("mdi:devices")),
];

/// Look up a module sensor description.
pub fn description(module: Module, key: &str) -> Option<&'static SensorDescription> {
    SENSORS
        .iter()
        .chain(SIGNAL_SENSORS)
        .find(|d| d.module == module && d.key == key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Sensor,
    Switch,
    Button,
}

/// What pressing a button or flipping a switch does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EntityAction {
    RebootRouter,
    RebootMeshNode { mac: String },
    MeshLed { mac: String },
}

/// One entity with its current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub unique_id: String,
    pub name: String,
    pub kind: EntityKind,
    /// Name of the physical device the entity belongs to.
    pub device: String,
    pub state: Option<Reading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<DeviceClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<StateClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<&'static str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<&'static str, Reading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<EntityAction>,
    pub available: bool,
}

impl Entity {
    fn new(unique_id: String, name: String, kind: EntityKind, device: &str, available: bool) -> Self {
        Self {
            unique_id,
            name,
            kind,
            device: device.to_owned(),
            state: None,
            unit: None,
            device_class: None,
            state_class: None,
            icon: None,
            attributes: BTreeMap::new(),
            action: None,
            available,
        }
    }

    /// Command a button press issues.
    pub fn press(&self) -> Option<Command> {
        match (&self.kind, &self.action) {
            (EntityKind::Button, Some(EntityAction::RebootRouter)) => Some(Command::Reboot),
            (EntityKind::Button, Some(EntityAction::RebootMeshNode { mac })) => {
                Some(Command::RebootMeshNode { mac: mac.clone() })
            }
            _ => None,
        }
    }

    /// Command that turns a switch on or off.
    pub fn turn(&self, on: bool) -> Option<Command> {
        match (&self.kind, &self.action) {
            (EntityKind::Switch, Some(EntityAction::MeshLed { mac })) => Some(Command::SetMeshLed {
                mac: mac.clone(),
                enabled: on,
            }),
            _ => None,
        }
    }
}

/// Signal icon that follows the bar count.
fn signal_icon(bars: Option<i64>) -> &'static str {
    match bars {
        None | Some(0) => "mdi:network-strength-off-outline",
        Some(1) => "mdi:network-strength-1",
        Some(2) => "mdi:network-strength-2",
        Some(3) => "mdi:network-strength-3",
        Some(n) if n >= 4 => "mdi:network-strength-4",
        Some(_) => "mdi:network-strength-outline",
    }
}

/// LED state as reported by the mesh feed (`1`/`0`, `on`/`off`, booleans).
fn led_on(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "default-on" => Some(true),
        "0" | "off" | "false" | "none" => Some(false),
        _ => None,
    }
}

fn sensor_entity(
    entry: &str,
    desc: &SensorDescription,
    snapshot: &Snapshot,
    router_name: &str,
) -> Entity {
    let mut entity = Entity::new(
        format!("{entry}-{}-{}", desc.module, desc.key),
        desc.name.to_owned(),
        EntityKind::Sensor,
        router_name,
        snapshot.available,
    );
    entity.state = snapshot.data.reading(desc.module, desc.key);
    entity.unit = desc.unit;
    entity.device_class = desc.device_class;
    entity.state_class = desc.state_class;
    entity.icon = desc.icon;
    entity.attributes = snapshot.data.attributes(desc.module, desc.key);
    entity
}

fn mesh_reading(node: &MeshNode, key: &str) -> Option<Reading> {
    let text = |v: Option<&String>| v.map(|s| Reading::from(s.as_str()));
    match key {
        "name" => text(node.name.as_ref()),
        "model" => text(node.model.as_ref()),
        "mac_address" => Some(Reading::from(node.mac_address.as_str())),
        "firmware_version" => text(node.firmware_version.as_ref()),
        "status" => node.status.map(|s| Reading::from(s.as_str())),
        "ip_address" => text(node.ip_address.as_ref()),
        "connected_devices" => node.connected_devices.map(Reading::from),
        _ => None,
    }
}

/// Build every entity for the current snapshot.
///
/// Module sensors appear only for modules present in the snapshot; mesh
/// entities follow the nodes of the last successful poll.
pub fn build_entities(config: &RouterConfig, snapshot: &Snapshot) -> Vec<Entity> {
    let entry = config.entry_id.as_str();
    let model = config.model.as_str();
    let data = &snapshot.data;
    let router_name = data
        .mesh
        .as_ref()
        .and_then(|m| m.main_router_name.as_deref())
        .unwrap_or(DEFAULT_ROUTER_NAME);
    let mut entities = Vec::new();

    for desc in SENSORS {
        if data.has(desc.module) && existing_feature(model, desc.module, Some(desc.key)) {
            entities.push(sensor_entity(entry, desc, snapshot, router_name));
        }
    }

    for desc in SIGNAL_SENSORS {
        if existing_feature(model, desc.module, Some(desc.key)) {
            let mut entity = sensor_entity(entry, desc, snapshot, router_name);
            if desc.key == "signal" {
                entity.icon = Some(signal_icon(entity.state.as_ref().and_then(Reading::as_i64)));
            }
            entities.push(entity);
        }
    }

    for device_id in config.tracked_devices() {
        let device = data.tracked_device(device_id);
        for (key, suffix, unit) in DEVICE_SENSORS {
            let mut entity = Entity::new(
                format!("{entry}-{device_id}-{key}"),
                format!("{device_id} {suffix}"),
                EntityKind::Sensor,
                router_name,
                snapshot.available,
            );
            entity.unit = *unit;
            if unit.is_some() {
                entity.device_class = Some(DeviceClass::DataRate);
                entity.state_class = Some(StateClass::Measurement);
            }
            entity.state = device.and_then(|d| match *key {
                "mac" => d.mac.as_deref().map(Reading::from),
                "hostname" => d.hostname.as_deref().map(Reading::from),
                "up_speed" => d.up_speed.map(Reading::from),
                "down_speed" => d.down_speed.map(Reading::from),
                _ => None,
            });
            entities.push(entity);
        }
    }

    let mut reboot = Entity::new(
        format!("{entry}-reboot"),
        "Reboot".into(),
        EntityKind::Button,
        router_name,
        snapshot.available,
    );
    reboot.icon = Some("mdi:restart");
    reboot.action = Some(EntityAction::RebootRouter);
    entities.push(reboot);

    if existing_feature(model, Module::Mesh, None) {
        for node in data.mesh_nodes() {
            entities.extend(mesh_entities(entry, node, snapshot.available));
        }
    }

    entities
}

fn mesh_entities(entry: &str, node: &MeshNode, available: bool) -> Vec<Entity> {
    let mac = node.mac_address.as_str();
    let mesh_name = node.name.as_deref().unwrap_or(mac);
    let mut entities = Vec::with_capacity(MESH_SENSORS.len() + 2);

    for (key, suffix, icon) in MESH_SENSORS {
        let mut entity = Entity::new(
            format!("{entry}-mesh-{mac}-{key}"),
            format!("{mesh_name} {suffix}"),
            EntityKind::Sensor,
            mesh_name,
            available,
        );
        entity.icon = *icon;
        entity.state = mesh_reading(node, key);
        if *key == "connected_devices" {
            entity.state_class = Some(StateClass::Measurement);
        }
        entities.push(entity);
    }

    let mut led = Entity::new(
        format!("{entry}-mesh-{mac}-led"),
        format!("{mesh_name} LED"),
        EntityKind::Switch,
        mesh_name,
        available,
    );
    let led_state = led_on(node.led_status.as_deref());
    led.state = led_state.map(Reading::from);
    led.icon = Some(if led_state == Some(false) { "mdi:led-off" } else { "mdi:led-on" });
    led.action = Some(EntityAction::MeshLed { mac: mac.to_owned() });
    entities.push(led);

    let mut reboot = Entity::new(
        format!("{entry}-mesh-{mac}-reboot"),
        format!("{mesh_name} Reboot"),
        EntityKind::Button,
        mesh_name,
        available,
    );
    reboot.icon = Some("mdi:restart");
    reboot.action = Some(EntityAction::RebootMeshNode { mac: mac.to_owned() });
    entities.push(reboot);

    entities
}
