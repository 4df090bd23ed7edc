//! Mesh command handlers.

use cudy_core::model::{MeshNode, NodeStatus};
use cudy_core::{Command as CoreCommand, CommandResult, Controller};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOpts, LedState, MeshArgs, MeshCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
    #[tabled(rename = "Backhaul")]
    backhaul: String,
    #[tabled(rename = "Clients")]
    clients: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn node_row(node: &MeshNode, color: bool) -> NodeRow {
    let status = node.status.map_or_else(
        || "-".into(),
        |s| output::paint_state(s.as_str(), Some(s == NodeStatus::Online), color),
    );
    NodeRow {
        mac: node.mac_address.clone(),
        name: util::or_dash(node.name.as_deref()),
        model: util::or_dash(node.model.as_deref()),
        ip: util::or_dash(node.ip_address.as_deref()),
        firmware: util::or_dash(node.firmware_version.as_deref()),
        backhaul: util::or_dash(node.backhaul.as_deref()),
        clients: util::or_dash(node.connected_devices),
        status,
    }
}

#[derive(Serialize)]
struct LedReport<'a> {
    mac: &'a str,
    enabled: bool,
}

pub async fn handle(
    controller: &Controller,
    args: MeshArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        MeshCommand::List => {
            let snapshot = controller.snapshot();
            let nodes: Vec<MeshNode> = snapshot.data.mesh_nodes().cloned().collect();
            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &nodes,
                |n| node_row(n, color),
                |n| n.mac_address.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MeshCommand::Reboot { node } => {
            let mac = util::resolve_mesh_mac(controller, &node)?;
            if !util::confirm(&format!("Reboot mesh node {mac}?"), "mesh reboot", global.yes)? {
                return Ok(());
            }
            controller
                .execute(CoreCommand::RebootMeshNode { mac })
                .await?;
            if !global.quiet {
                eprintln!("Mesh node reboot initiated");
            }
            Ok(())
        }

        MeshCommand::Led { node, state: None } => {
            let mac = util::resolve_mesh_mac(controller, &node)?;
            let result = controller
                .execute(CoreCommand::MeshLedState { mac: mac.clone() })
                .await?;
            let enabled = match result {
                CommandResult::LedState { enabled, .. } => enabled,
                other => {
                    return Err(CliError::ApiError {
                        code: "unexpected_result".into(),
                        message: format!("LED query returned {other:?}"),
                    });
                }
            };
            let report = LedReport { mac: &mac, enabled };
            let label = if enabled { "on" } else { "off" };
            let out = output::render_single(
                &global.output,
                &report,
                |r| format!("LED on {}: {label}", r.mac),
                |_| label.to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MeshCommand::Led {
            node,
            state: Some(state),
        } => {
            let mac = util::resolve_mesh_mac(controller, &node)?;
            let enabled = matches!(state, LedState::On);
            controller
                .execute(CoreCommand::SetMeshLed { mac, enabled })
                .await?;
            if !global.quiet {
                let label = if enabled { "enabled" } else { "disabled" };
                eprintln!("Mesh LED {label}");
            }
            Ok(())
        }
    }
}
