//! CLI flag overrides on top of `cudy-config` profiles.
//!
//! Core never sees these types; it receives a pre-built `RouterConfig`.

use cudy_config::{Config, Profile};
use cudy_core::RouterConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.active_profile_name().to_owned())
}

/// Apply `--host`, `--username`, `--insecure`, and `--timeout` to a profile.
pub fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(host) = &global.host {
        profile.host.clone_from(host);
    }
    if let Some(username) = &global.username {
        profile.username.clone_from(username);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    profile
}

/// Build a `RouterConfig` from the config file, profile, and CLI overrides.
///
/// Without a stored profile, `--host` alone is enough; the password then
/// has to come from `CUDY_PASSWORD` or the keyring.
pub fn build_router_config(global: &GlobalOpts) -> Result<(String, RouterConfig), CliError> {
    let cfg = cudy_config::load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = if let Some(profile) = cfg.profiles.get(&profile_name) {
        profile.clone()
    } else if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            available: available_profiles(&cfg),
            name: profile_name,
        });
    } else if global.host.is_some() {
        Profile::new(
            cudy_core::config::DEFAULT_HOST,
            cudy_core::config::DEFAULT_USERNAME,
        )
    } else {
        return Err(CliError::NoConfig {
            path: cudy_config::config_path().display().to_string(),
        });
    };

    let profile = apply_overrides(profile, global);
    let router = cudy_config::profile_to_router_config(&profile, &profile_name)?;
    Ok((profile_name, router))
}

/// Comma-separated profile names for error help text.
pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["cudy"];
        argv.extend_from_slice(args);
        argv.push("sensors");
        Cli::parse_from(argv).global
    }

    #[test]
    fn flags_override_profile_values() {
        let profile = Profile {
            timeout: Some(30),
            insecure: Some(false),
            ..Profile::new("192.168.10.1", "admin")
        };
        let merged = apply_overrides(
            profile,
            &global(&["--host", "10.0.0.1", "-u", "root", "-k", "--timeout", "5"]),
        );
        assert_eq!(merged.host, "10.0.0.1");
        assert_eq!(merged.username, "root");
        assert_eq!(merged.insecure, Some(true));
        assert_eq!(merged.timeout, Some(5));
    }

    #[test]
    fn absent_flags_keep_profile_values() {
        let merged = apply_overrides(Profile::new("192.168.10.1", "admin"), &global(&[]));
        assert_eq!(merged.host, "192.168.10.1");
        assert_eq!(merged.insecure, None);
    }
}
