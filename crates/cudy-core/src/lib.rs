// cudy-core: Polling controller and entity model between cudy-api and consumers.

pub mod collect;
pub mod command;
pub mod config;
pub mod controller;
pub mod entity;
pub mod error;
pub mod features;
pub mod model;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::{RouterConfig, TlsVerification, normalize_scan_interval};
pub use controller::{ConnectionState, Controller};
pub use entity::{Entity, EntityAction, EntityKind, build_entities};
pub use error::CoreError;
pub use features::{existing_feature, module_supported};
pub use stream::SnapshotStream;

pub use model::{DevicesData, Module, Reading, RouterData, Snapshot};
