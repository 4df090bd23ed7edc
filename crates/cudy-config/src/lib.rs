//! Shared configuration for Cudy router tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `cudy_core::RouterConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use cudy_core::config::{DEFAULT_MODEL, DEFAULT_SCAN_INTERVAL_SECS};
use cudy_core::{Module, RouterConfig, TlsVerification, normalize_scan_interval};
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Keyring service name; entries are keyed `{profile}/password`.
pub const KEYRING_SERVICE: &str = "cudy";

/// Environment variable checked first for the router password.
pub const PASSWORD_ENV: &str = "CUDY_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named router profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use when none is given.
    pub fn active_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles.get(name).ok_or_else(|| ConfigError::UnknownProfile {
            profile: name.into(),
        })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_insecure")]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: default_insecure(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_insecure() -> bool {
    true
}
fn default_timeout() -> u64 {
    30
}

/// A scan interval as written in the file or the environment.
///
/// Kept loose so `scan_interval = 60` and `CUDY_..._SCAN_INTERVAL=abc`
/// both load; normalisation happens when the profile is used.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScanInterval {
    Secs(i64),
    Raw(String),
}

impl fmt::Display for ScanInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secs(secs) => write!(f, "{secs}"),
            Self::Raw(raw) => f.write_str(raw),
        }
    }
}

/// A named router profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Router address: bare host or full URL (e.g. "192.168.10.1").
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_username")]
    pub username: String,

    /// Password (plaintext; prefer the keyring).
    pub password: Option<String>,

    /// Seconds between polls.
    pub scan_interval: Option<ScanInterval>,

    /// Enabled modules. Absent means all.
    pub modules: Option<Vec<String>>,

    /// Comma-separated MACs or hostnames that get per-device sensors.
    #[serde(default)]
    pub device_list: String,

    /// Router model, e.g. "WR3000S V1.0".
    pub model: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

fn default_host() -> String {
    cudy_core::config::DEFAULT_HOST.into()
}
fn default_username() -> String {
    cudy_core::config::DEFAULT_USERNAME.into()
}

impl Profile {
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            ..Self::default()
        }
    }

    /// Scan interval after clamping.
    pub fn scan_interval_secs(&self) -> u64 {
        self.scan_interval
            .as_ref()
            .map_or(DEFAULT_SCAN_INTERVAL_SECS, |raw| {
                normalize_scan_interval(&raw.to_string())
            })
    }

    /// Enabled modules. Unknown names are a validation error.
    pub fn enabled_modules(&self) -> Result<BTreeSet<Module>, ConfigError> {
        let Some(names) = &self.modules else {
            return Ok(Module::all());
        };
        names
            .iter()
            .map(|name| {
                Module::from_str(name.trim()).map_err(|_| ConfigError::Validation {
                    field: "modules".into(),
                    reason: format!("unknown module '{name}'"),
                })
            })
            .collect()
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
///
/// `CUDY_CONFIG` overrides the location.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("CUDY_CONFIG") {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "cudy", "cudy").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("cudy");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path`, then `CUDY_` env vars. Nested keys use `__`, e.g.
/// `CUDY_PROFILES__HOME__HOST`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed("CUDY_")
                .ignore(&["PASSWORD", "CONFIG"])
                .split("__"),
        );

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        debug!(error = %e, "using default config");
        Config::default()
    })
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/password"),
    )?)
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

/// Resolve the router password: `CUDY_PASSWORD`, then the keyring,
/// then the plaintext profile field.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    // 2. Keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Build a `RouterConfig` from a profile, resolving the password.
pub fn profile_to_router_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<RouterConfig, ConfigError> {
    let password = resolve_password(profile, profile_name)?;
    build_router_config(profile, profile_name, password)
}

/// Build a `RouterConfig` from a profile with an already-resolved password.
pub fn build_router_config(
    profile: &Profile,
    profile_name: &str,
    password: SecretString,
) -> Result<RouterConfig, ConfigError> {
    let host = profile.host.trim();
    if host.is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }

    let tls = if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else if profile.insecure.unwrap_or(true) {
        TlsVerification::DangerAcceptInvalid // routers ship self-signed
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(RouterConfig {
        entry_id: profile_name.to_owned(),
        host: host.to_owned(),
        username: profile.username.clone(),
        password,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or_else(default_timeout)),
        scan_interval_secs: profile.scan_interval_secs(),
        modules: profile.enabled_modules()?,
        device_list: profile.device_list.clone(),
        model: profile
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.into()),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).expect("write");
        (dir, path)
    }

    #[test]
    fn profiles_load_from_toml() {
        let (_dir, path) = write_config(
            r#"
default_profile = "home"

[profiles.home]
host = "192.168.10.1"
username = "admin"
scan_interval = 5
modules = ["modem", "wifi_2g", "mesh"]
device_list = "AA:BB:CC:DD:EE:FF, laptop"
model = "WR3000S V1.0"
"#,
        );
        let config = load_config_from(&path).expect("load");
        assert_eq!(config.active_profile_name(), "home");

        let profile = config.profile("home").expect("profile");
        assert_eq!(profile.scan_interval_secs(), 15);
        let modules = profile.enabled_modules().expect("modules");
        assert_eq!(
            modules,
            [Module::Modem, Module::Wifi2g, Module::Mesh]
                .into_iter()
                .collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config_from(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(config.active_profile_name(), "default");
        assert!(config.defaults.insecure);
        assert!(matches!(
            config.profile("nope"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn unparsable_scan_interval_uses_default() {
        let profile = Profile {
            scan_interval: Some(ScanInterval::Raw("soon".into())),
            ..Profile::new("10.0.0.1", "admin")
        };
        assert_eq!(profile.scan_interval_secs(), DEFAULT_SCAN_INTERVAL_SECS);

        let profile = Profile {
            scan_interval: Some(ScanInterval::Secs(99_999)),
            ..Profile::new("10.0.0.1", "admin")
        };
        assert_eq!(profile.scan_interval_secs(), 3600);
    }

    #[test]
    fn unknown_module_is_rejected() {
        let profile = Profile {
            modules: Some(vec!["modem".into(), "toaster".into()]),
            ..Profile::new("10.0.0.1", "admin")
        };
        assert!(matches!(
            profile.enabled_modules(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn router_config_carries_profile_settings() {
        let profile = Profile {
            device_list: "laptop".into(),
            timeout: Some(10),
            insecure: Some(false),
            ..Profile::new(" 192.168.10.1 ", "root")
        };
        let config =
            build_router_config(&profile, "home", SecretString::from("pw")).expect("config");

        assert_eq!(config.entry_id, "home");
        assert_eq!(config.host, "192.168.10.1");
        assert_eq!(config.username, "root");
        assert_eq!(config.password.expose_secret(), "pw");
        assert_eq!(config.tls, TlsVerification::SystemDefaults);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.scan_interval_secs, DEFAULT_SCAN_INTERVAL_SECS);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.modules, Module::all());
    }

    #[test]
    fn blank_host_is_rejected() {
        let result = build_router_config(
            &Profile::new("  ", "admin"),
            "home",
            SecretString::from("pw"),
        );
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn saved_config_round_trips_profiles() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config
            .profiles
            .insert("home".into(), Profile::new("192.168.10.1", "admin"));

        save_config_to(&config, &path).expect("save");
        let loaded = load_config_from(&path).expect("load");
        assert_eq!(loaded.profile("home").expect("profile").host, "192.168.10.1");
    }
}
