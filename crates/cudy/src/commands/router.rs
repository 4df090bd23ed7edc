//! Router-level actions: reboot, modem reset, band switch, SMS, AT commands.

use cudy_core::{Command as CoreCommand, CommandResult, Controller};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn reboot(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    if !util::confirm("Reboot the router?", "reboot", global.yes)? {
        return Ok(());
    }
    controller.execute(CoreCommand::Reboot).await?;
    if !global.quiet {
        eprintln!("Router reboot initiated");
    }
    Ok(())
}

pub async fn restart_5g(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    if !util::confirm(
        "Reset the modem? The cellular connection drops while it reconnects.",
        "restart-5g",
        global.yes,
    )? {
        return Ok(());
    }
    controller.execute(CoreCommand::Restart5gConnection).await?;
    if !global.quiet {
        eprintln!("Modem reset initiated");
    }
    Ok(())
}

pub async fn switch_band(
    controller: &Controller,
    band: String,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !util::confirm(&format!("Switch cellular band to {band}?"), "band", global.yes)? {
        return Ok(());
    }
    controller.execute(CoreCommand::SwitchBand { band }).await?;
    if !global.quiet {
        eprintln!("Band switch submitted");
    }
    Ok(())
}

pub async fn send_sms(
    controller: &Controller,
    phone_number: String,
    message: String,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    controller
        .execute(CoreCommand::SendSms {
            phone_number,
            message,
        })
        .await?;
    if !global.quiet {
        eprintln!("SMS sent");
    }
    Ok(())
}

pub async fn at_command(
    controller: &Controller,
    command: String,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let result = controller
        .execute(CoreCommand::SendAtCommand { command })
        .await?;
    let out = match &result {
        CommandResult::AtResponse { output: reply, .. } => output::render_single(
            &global.output,
            &result,
            |_| reply.trim().to_owned(),
            |_| reply.trim().to_owned(),
        )?,
        other => {
            return Err(CliError::ApiError {
                code: "unexpected_result".into(),
                message: format!("AT command returned {other:?}"),
            });
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
