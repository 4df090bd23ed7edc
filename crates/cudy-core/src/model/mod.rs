// ── Domain model ──
//
// Typed per-module records as produced by the collector, the snapshot the
// controller publishes, and the scalar `Reading` entities expose.

pub mod module;
pub mod reading;
pub mod snapshot;

pub use module::Module;
pub use reading::Reading;
pub use snapshot::{DevicesData, RouterData, Snapshot};

// Parsed records are owned by cudy-api; re-export them so consumers only
// depend on this crate.
pub use cudy_api::parse::{
    CarrierBands, CellInfo, ClientCounts, ConnectedDevice, DataUsage, DevicesInfo, DhcpStatus,
    LanStatus, MeshNode, MeshOverview, ModemInfo, NodeStatus, SmsStatus, SystemStatus, VpnStatus,
    WanStatus, WifiStatus,
};
