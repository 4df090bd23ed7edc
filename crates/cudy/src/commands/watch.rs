//! Watch command: keep polling and print one line per snapshot.

use std::fmt::Write as _;
use std::sync::Arc;

use cudy_core::{Controller, Module, Snapshot, normalize_scan_interval};
use serde::Serialize;

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Flat per-poll record for machine-readable watch output.
#[derive(Serialize)]
struct WatchLine<'a> {
    poll: u64,
    updated_at: Option<String>,
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    modules: Vec<&'static str>,
}

fn line(snapshot: &Snapshot, global: &GlobalOpts, color: bool) -> Result<String, CliError> {
    let updated_at = snapshot
        .updated_at
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string());
    let modules: Vec<&'static str> = Module::all()
        .into_iter()
        .filter(|m| snapshot.data.has(*m))
        .map(Module::as_str)
        .collect();

    match global.output {
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            let record = WatchLine {
                poll: snapshot.poll_count,
                updated_at,
                available: snapshot.available,
                error: snapshot.last_error.as_deref(),
                modules,
            };
            Ok(serde_json::to_string(&record)?)
        }
        OutputFormat::Table | OutputFormat::Plain => {
            let state = if snapshot.available {
                output::paint_state("ok", Some(true), color)
            } else {
                output::paint_state("failed", Some(false), color)
            };
            let mut text = format!(
                "[{}] poll #{} {state} ({} modules)",
                updated_at.as_deref().unwrap_or("--:--:--"),
                snapshot.poll_count,
                modules.len(),
            );
            if let Some(err) = &snapshot.last_error {
                let _ = write!(text, ": {}", output::dim(err, color));
            }
            Ok(text)
        }
    }
}

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (_, mut router) = config::build_router_config(global)?;
    if let Some(raw) = &args.interval {
        router.scan_interval_secs = normalize_scan_interval(raw);
    }
    tracing::info!(interval = router.scan_interval_secs, "starting watch");

    let controller = Controller::new(router);
    controller.connect().await?;
    let color = output::should_color(&global.color);

    let mut stream = controller.subscribe();
    let print = |snap: &Arc<Snapshot>| -> Result<(), CliError> {
        output::print_output(&line(snap, global, color)?, global.quiet);
        Ok(())
    };
    print(stream.current())?;

    let result = loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break Ok(()),
            next = stream.changed() => match next {
                Some(snap) => {
                    if let Err(e) = print(&snap) {
                        break Err(e);
                    }
                }
                None => break Ok(()),
            },
        }
    };

    controller.disconnect().await;
    result
}
