//! Shared helpers for command handlers.

use std::io::IsTerminal;

use cudy_core::Controller;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so the action is refused.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// `80afca112233`, `80-af-ca-11-22-33`, and `80:af:ca:11:22:33` all read as
/// `80:AF:CA:11:22:33`. Anything else is returned unchanged.
pub fn normalize_mac(raw: &str) -> String {
    let hex: String = raw
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.'))
        .collect();
    if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return raw.to_owned();
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).to_uppercase())
        .collect::<Vec<_>>()
        .join(":")
}

/// Resolve a mesh node identifier (MAC in any common spelling, or node
/// name) to the MAC the router knows it by.
pub fn resolve_mesh_mac(controller: &Controller, identifier: &str) -> Result<String, CliError> {
    let snapshot = controller.snapshot();
    let mac = normalize_mac(identifier);
    snapshot
        .data
        .mesh_nodes()
        .find(|node| {
            node.mac_address.eq_ignore_ascii_case(&mac)
                || node
                    .name
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(identifier))
        })
        .map(|node| node.mac_address.clone())
        .ok_or_else(|| CliError::NotFound {
            resource_type: "mesh node".into(),
            identifier: identifier.into(),
            list_command: "mesh list".into(),
        })
}

/// "-" for absent values in detail views and tables.
pub fn or_dash(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}
