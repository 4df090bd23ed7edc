//! Pure parsers for LuCI status pages.
//!
//! Every parser takes a page body and returns a typed record whose fields
//! are all optional: a missing or malformed field comes back as `None`,
//! and an empty body yields an all-absent record. Only the mesh client
//! JSON feed can fail outright, since there is no partial reading of a
//! broken JSON document.

mod devices;
mod forms;
mod mesh;
mod modem;
mod network;
mod status;
mod system;
mod tables;
mod values;

pub use devices::{
    ClientCounts, ConnectedDevice, DevicesInfo, list_devices, parse_devices, parse_devices_status,
};
pub use forms::{at_command_output, band_select_name, hidden_input, led_state_from_page};
pub use mesh::{
    MAIN_ROUTER_ID, MeshClientDetail, MeshClientEntry, MeshNode, MeshOverview, NodeStatus,
    SysReport, extract_mesh_client_ids, parse_mesh_client_status, parse_mesh_clients,
    parse_mesh_devices,
};
pub use modem::{CarrierBands, CellInfo, ModemInfo, parse_modem_info, sim_slot};
pub use network::{
    DhcpStatus, VpnStatus, WanStatus, looks_like_wan_page, parse_dhcp_status, parse_vpn_status,
    parse_wan_status,
};
pub use status::{
    DataUsage, LanStatus, SmsStatus, WifiStatus, parse_data_usage, parse_lan_status,
    parse_sms_status, parse_wifi_status,
};
pub use system::{SystemStatus, parse_system_status};
pub use tables::Fields;
pub use values::{
    as_int, band_label, clean_text, format_compact_mac, hex_as_int, normalize_mac,
    parse_data_size, parse_duration_secs, parse_speed, pseudo_mac, signal_strength,
    split_upload_download,
};
