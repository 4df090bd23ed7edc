//! Sensors command: every entity the latest snapshot produces.

use cudy_core::{Controller, Entity, EntityKind};
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Device")]
    device: String,
}

fn kind_name(kind: &EntityKind) -> &'static str {
    match kind {
        EntityKind::Sensor => "sensor",
        EntityKind::Switch => "switch",
        EntityKind::Button => "button",
    }
}

fn to_row(entity: &Entity, color: bool) -> EntityRow {
    let state = match (&entity.state, entity.unit) {
        _ if !entity.available => output::dim("unavailable", color),
        (Some(value), Some(unit)) => format!("{value} {unit}"),
        (state, _) => util::or_dash(state.as_ref()),
    };
    EntityRow {
        id: entity.unique_id.clone(),
        name: entity.name.clone(),
        kind: kind_name(&entity.kind),
        state,
        device: entity.device.clone(),
    }
}

pub fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let entities = controller.entities();
    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &entities,
        |e| to_row(e, color),
        |e| e.unique_id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
