// ── Pollable modules ──

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// One group of router pages polled together.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum Module {
    #[strum(serialize = "modem")]
    Modem,
    #[strum(serialize = "devices")]
    Devices,
    #[strum(serialize = "system")]
    System,
    #[strum(serialize = "data_usage")]
    DataUsage,
    #[strum(serialize = "sms")]
    Sms,
    #[serde(rename = "wifi_2g")]
    #[strum(serialize = "wifi_2g")]
    Wifi2g,
    #[serde(rename = "wifi_5g")]
    #[strum(serialize = "wifi_5g")]
    Wifi5g,
    #[strum(serialize = "lan")]
    Lan,
    #[strum(serialize = "mesh")]
    Mesh,
    #[strum(serialize = "vpn")]
    Vpn,
    #[strum(serialize = "wan")]
    Wan,
    #[strum(serialize = "dhcp")]
    Dhcp,
}

impl Module {
    /// Every module, in polling order.
    pub fn all() -> BTreeSet<Self> {
        Self::iter().collect()
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Field keys this module reports.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Modem => &[
                "signal",
                "network",
                "sim",
                "connected_time",
                "cell",
                "rsrp",
                "rsrq",
                "sinr",
                "rssi",
                "band",
                "public_ip",
                "wan_ip",
                "imei",
                "imsi",
                "iccid",
                "mode",
                "bandwidth",
                "session_upload",
                "session_download",
            ],
            Self::Devices => &[
                "device_count",
                "top_downloader_speed",
                "top_downloader_mac",
                "top_downloader_hostname",
                "top_uploader_speed",
                "top_uploader_mac",
                "top_uploader_hostname",
                "total_down_speed",
                "total_up_speed",
                "wifi_2g_clients",
                "wifi_5g_clients",
                "wired_clients",
                "total_clients",
            ],
            Self::System => &["uptime", "local_time", "firmware_version"],
            Self::DataUsage => &["current_traffic", "monthly_traffic", "total_traffic"],
            Self::Sms => &["inbox_count", "outbox_count", "unread_count"],
            Self::Wifi2g | Self::Wifi5g => &["ssid", "channel", "enabled"],
            Self::Lan => &["ip_address", "mac_address"],
            Self::Mesh => &["mesh_count", "main_router_name"],
            Self::Vpn => &["protocol", "vpn_clients"],
            Self::Wan => &[
                "protocol",
                "connected_time",
                "mac_address",
                "public_ip",
                "wan_ip",
                "subnet_mask",
                "gateway",
                "dns",
                "session_upload",
                "session_download",
            ],
            Self::Dhcp => &[
                "dhcp_ip_start",
                "dhcp_ip_end",
                "dhcp_prefered_dns",
                "dhcp_default_gateway",
                "dhcp_leasetime",
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn names_round_trip_through_strum_and_serde() {
        for module in Module::iter() {
            assert_eq!(Module::from_str(module.as_str()).ok(), Some(module));
            let json = serde_json::to_string(&module).expect("serialize");
            assert_eq!(json, format!("\"{module}\""));
        }
        assert_eq!(Module::from_str("WIFI_5G").ok(), Some(Module::Wifi5g));
        assert!(Module::from_str("satellite").is_err());
    }
}
