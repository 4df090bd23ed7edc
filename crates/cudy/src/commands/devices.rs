//! Devices command: clients the router reports as connected.

use cudy_core::Controller;
use cudy_core::model::ConnectedDevice;
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Up (Mbit/s)")]
    up: String,
    #[tabled(rename = "Down (Mbit/s)")]
    down: String,
}

impl From<&ConnectedDevice> for DeviceRow {
    fn from(d: &ConnectedDevice) -> Self {
        Self {
            hostname: util::or_dash(d.hostname.as_deref()),
            ip: util::or_dash(d.ip.as_deref()),
            mac: util::or_dash(d.mac.as_deref()),
            up: d.up_speed.map_or_else(|| "-".into(), |v| format!("{v:.2}")),
            down: d.down_speed.map_or_else(|| "-".into(), |v| format!("{v:.2}")),
        }
    }
}

pub fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = controller.snapshot();
    let devices = snapshot
        .data
        .devices
        .as_ref()
        .map(|d| d.info.devices.as_slice())
        .ok_or_else(|| CliError::NotFound {
            resource_type: "module".into(),
            identifier: "devices".into(),
            list_command: "status".into(),
        })?;

    let out = output::render_list(&global.output, devices, |d| DeviceRow::from(d), |d| {
        d.mac.clone().or_else(|| d.hostname.clone()).unwrap_or_default()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
