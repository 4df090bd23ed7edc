//! Status command: the latest polled data, whole or per module.

use std::str::FromStr;
use std::time::Duration;

use cudy_core::{Controller, Module, Reading, RouterData};
use tabled::Tabled;

use crate::cli::{GlobalOpts, OutputFormat, StatusArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Module")]
    module: &'static str,
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Durations read better as `3days 4h 12m` than as seconds.
const DURATION_KEYS: &[&str] = &["connected_time", "uptime"];

fn display_value(key: &str, reading: Option<&Reading>) -> String {
    match reading {
        Some(Reading::Int(secs)) if DURATION_KEYS.contains(&key) => u64::try_from(*secs)
            .map_or_else(
                |_| secs.to_string(),
                |s| humantime::format_duration(Duration::from_secs(s)).to_string(),
            ),
        other => util::or_dash(other),
    }
}

fn rows(data: &RouterData, modules: &[Module]) -> Vec<FieldRow> {
    modules
        .iter()
        .filter(|m| data.has(**m))
        .flat_map(|&module| {
            module.fields().iter().map(move |&field| FieldRow {
                module: module.as_str(),
                field,
                value: display_value(field, data.reading(module, field).as_ref()),
            })
        })
        .collect()
}

pub fn parse_module(raw: &str) -> Result<Module, CliError> {
    Module::from_str(raw.trim()).map_err(|_| CliError::Validation {
        field: "module".into(),
        reason: format!("unknown module '{raw}'; expected one of: {}", module_names()),
    })
}

/// Comma-separated module names for help text.
fn module_names() -> String {
    Module::all()
        .into_iter()
        .map(Module::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(
    controller: &Controller,
    args: StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snapshot = controller.snapshot();
    if !snapshot.available && !global.quiet {
        eprintln!(
            "warning: last poll failed ({}); showing previous values",
            snapshot.last_error.as_deref().unwrap_or("unknown error")
        );
    }
    let data = &snapshot.data;

    let out = match args.module {
        Some(raw) => {
            let module = parse_module(&raw)?;
            let json = data.module_json(module).ok_or_else(|| CliError::NotFound {
                resource_type: "module".into(),
                identifier: module.as_str().into(),
                list_command: "status".into(),
            })?;
            let table = output::render_table(&rows(data, &[module]));
            output::render_single(
                &global.output,
                &json,
                |_| table.clone(),
                |_| {
                    module
                        .fields()
                        .iter()
                        .map(|f| {
                            let value = display_value(f, data.reading(module, f).as_ref());
                            format!("{f}={value}")
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                },
            )?
        }
        None => {
            let modules: Vec<Module> = Module::all().into_iter().collect();
            let rows = rows(data, &modules);
            match global.output {
                OutputFormat::Table => output::render_table(&rows),
                OutputFormat::Plain => rows
                    .iter()
                    .map(|r| format!("{}.{}={}", r.module, r.field, r.value))
                    .collect::<Vec<_>>()
                    .join("\n"),
                _ => output::render_single(
                    &global.output,
                    &*snapshot,
                    |_| String::new(),
                    |_| String::new(),
                )?,
            }
        }
    };

    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use cudy_core::model::LanStatus;

    use super::*;

    #[test]
    fn durations_are_humanized() {
        assert_eq!(display_value("uptime", Some(&Reading::Int(3_661))), "1h 1m 1s");
        assert_eq!(display_value("signal", Some(&Reading::Int(4))), "4");
        assert_eq!(display_value("ssid", None), "-");
    }

    #[test]
    fn rows_skip_modules_without_data() {
        let data = RouterData {
            lan: Some(LanStatus {
                ip_address: Some("192.168.10.1".into()),
                mac_address: None,
            }),
            ..RouterData::default()
        };
        let rows = rows(&data, &[Module::Lan, Module::Wan]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value, "192.168.10.1");
        assert_eq!(rows[1].value, "-");
    }

    #[test]
    fn module_names_parse_case_insensitively() {
        assert_eq!(parse_module("WIFI_5G").expect("module"), Module::Wifi5g);
        assert!(parse_module("toaster").is_err());
    }
}
