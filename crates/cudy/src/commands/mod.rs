//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod mesh;
pub mod router;
pub mod sensors;
pub mod status;
pub mod util;
pub mod watch;

use cudy_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a router-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status(args) => status::handle(controller, args, global),
        Command::Sensors => sensors::handle(controller, global),
        Command::Devices => devices::handle(controller, global),
        Command::Mesh(args) => mesh::handle(controller, args, global).await,
        Command::Reboot => router::reboot(controller, global).await,
        Command::Restart5g => router::restart_5g(controller, global).await,
        Command::Band { band } => router::switch_band(controller, band, global).await,
        Command::Sms { phone, message } => {
            router::send_sms(controller, phone, message, global).await
        }
        Command::At { command } => router::at_command(controller, command, global).await,
        // Config, Completions, and Watch are handled before dispatch
        Command::Config(_) | Command::Completions(_) | Command::Watch(_) => unreachable!(),
    }
}
