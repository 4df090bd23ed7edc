//! Config subcommand handlers.

use std::collections::HashMap;
use std::str::FromStr;

use cudy_config::{Config, Profile, ScanInterval};
use cudy_core::Module;
use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_flag<T: FromStr>(key: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.trim().parse().map_err(|_| CliError::Validation {
        field: key.into(),
        reason: format!("must be {expected}"),
    })
}

/// Apply `config set <key> <value>` to a profile.
fn set_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "host" => profile.host = value,
        "username" => profile.username = value,
        "scan_interval" | "scan-interval" => {
            let secs: i64 = parse_flag(key, &value, "a number (seconds)")?;
            profile.scan_interval = Some(ScanInterval::Secs(secs));
        }
        "modules" => {
            let names: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect();
            if let Some(bad) = names.iter().find(|n| Module::from_str(n).is_err()) {
                return Err(CliError::Validation {
                    field: "modules".into(),
                    reason: format!("unknown module '{bad}'"),
                });
            }
            profile.modules = Some(names);
        }
        "device_list" | "device-list" => profile.device_list = value,
        "model" => profile.model = Some(value),
        "insecure" => profile.insecure = Some(parse_flag(key, &value, "'true' or 'false'")?),
        "timeout" => profile.timeout = Some(parse_flag(key, &value, "a number (seconds)")?),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: host, username, scan_interval, \
                     modules, device_list, model, insecure, timeout, ca_cert"
                ),
            });
        }
    }
    Ok(())
}

fn prompt_password() -> Result<String, CliError> {
    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(password)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => {
            let config_path = cudy_config::config_path();
            eprintln!("cudy configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let host: String = Input::new()
                .with_prompt("Router address")
                .default(cudy_core::config::DEFAULT_HOST.into())
                .interact_text()
                .map_err(prompt_err)?;

            let username: String = Input::new()
                .with_prompt("Username")
                .default(cudy_core::config::DEFAULT_USERNAME.into())
                .interact_text()
                .map_err(prompt_err)?;

            let password = prompt_password()?;

            let store_choices = &[
                "Store password in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let store_selection = Select::new()
                .with_prompt("Where to store the password?")
                .items(store_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let password_field = if store_selection == 0 {
                cudy_config::store_password(&profile_name, &password)?;
                eprintln!("   Password stored in system keyring");
                None
            } else {
                Some(password)
            };

            let model: String = Input::new()
                .with_prompt("Router model (optional, e.g. WR3000S V1.0)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let profile = Profile {
                password: password_field,
                model: (!model.trim().is_empty()).then(|| model.trim().to_owned()),
                ..Profile::new(host, username)
            };

            let mut profiles = HashMap::new();
            profiles.insert(profile_name.clone(), profile);
            let cfg = Config {
                default_profile: Some(profile_name.clone()),
                profiles,
                ..Config::default()
            };
            cudy_config::save_config(&cfg)?;

            eprintln!("\nConfiguration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: cudy status");
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = cudy_config::load_config_or_default();
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| format!("{c:#?}"),
                |_| "config".into(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = cudy_config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_insert_with(|| {
                Profile::new(
                    cudy_core::config::DEFAULT_HOST,
                    cudy_core::config::DEFAULT_USERNAME,
                )
            });
            set_key(profile, &key, value)?;
            cudy_config::save_config(&cfg)?;
            eprintln!("Set {key} on profile '{profile_name}'");
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = cudy_config::load_config_or_default();
            let default = cfg.active_profile_name();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: cudy config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = cudy_config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            cudy_config::save_config(&cfg)?;
            eprintln!("Default profile set to '{name}'");
            Ok(())
        }

        ConfigCommand::SetPassword { profile } => {
            let cfg = cudy_config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name: profile_name,
                });
            }
            let password = prompt_password()?;
            cudy_config::store_password(&profile_name, &password)?;
            eprintln!("Password stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}
