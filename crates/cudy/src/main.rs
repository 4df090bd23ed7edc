mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cudy_core::Controller;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a router connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "cudy", &mut std::io::stdout());
            Ok(())
        }

        // Watch keeps its own polling controller alive
        Command::Watch(args) => commands::watch::handle(args, &cli.global).await,

        cmd => {
            let (profile_name, mut router) = config::build_router_config(&cli.global)?;
            router.scan_interval_secs = 0;

            tracing::debug!(profile = %profile_name, command = ?cmd, "dispatching command");
            let controller = Controller::new(router);
            controller.connect().await?;
            let result = commands::dispatch(cmd, &controller, &cli.global).await;
            controller.disconnect().await;
            result
        }
    }
}
