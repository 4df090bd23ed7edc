// ── Runtime connection configuration ──
//
// These types describe *how* to talk to one router and what to poll.
// They carry credentials and tuning but never touch disk; the CLI builds
// a `RouterConfig` from its profile and hands it in.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use cudy_api::luci::base_url_for_host;
pub use cudy_api::luci::{DEFAULT_HOST, DEFAULT_USERNAME};
use cudy_api::{TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;
use crate::model::Module;

/// Poll interval used when none (or garbage) is configured.
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 60;
pub const MIN_SCAN_INTERVAL_SECS: u64 = 15;
pub const MAX_SCAN_INTERVAL_SECS: u64 = 3600;

/// Model name whose feature table applies to unknown routers.
pub const DEFAULT_MODEL: &str = "default";

/// Clamp a user-supplied scan interval into the supported range.
///
/// Accepts anything string-like so raw profile values and CLI flags go
/// through the same path. Input that is not an integer yields the default.
pub fn normalize_scan_interval(raw: &str) -> u64 {
    match raw.trim().parse::<i64>() {
        Ok(secs) => {
            let secs = u64::try_from(secs).unwrap_or(0);
            secs.clamp(MIN_SCAN_INTERVAL_SECS, MAX_SCAN_INTERVAL_SECS)
        }
        Err(_) => DEFAULT_SCAN_INTERVAL_SECS,
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Cudy routers ship self-signed certificates.
    #[default]
    DangerAcceptInvalid,
}

impl TlsVerification {
    fn to_transport(&self) -> TlsMode {
        match self {
            Self::SystemDefaults => TlsMode::System,
            Self::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            Self::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Configuration for one router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Identifier prefixed to every entity unique id.
    pub entry_id: String,
    /// Host as entered by the user: bare address or full URL.
    pub host: String,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Seconds between background polls. 0 disables the poll task.
    pub scan_interval_secs: u64,
    /// Modules the user asked for. Feature gating may drop more.
    pub modules: BTreeSet<Module>,
    /// Comma-separated MACs or hostnames that get per-device sensors.
    pub device_list: String,
    /// Router model, e.g. `WR3000S V1.0`.
    pub model: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            entry_id: "cudy".into(),
            host: DEFAULT_HOST.into(),
            username: DEFAULT_USERNAME.into(),
            password: SecretString::from(String::new()),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
            modules: Module::all(),
            device_list: String::new(),
            model: DEFAULT_MODEL.into(),
        }
    }
}

impl RouterConfig {
    /// Normalised router base URL.
    pub fn base_url(&self) -> Result<Url, CoreError> {
        base_url_for_host(&self.host).map_err(|e| CoreError::Config {
            message: format!("invalid host '{}': {e}", self.host),
        })
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.to_transport(),
            timeout: self.timeout,
            cookie_jar: None,
        }
    }

    /// Entries of `device_list`, trimmed, blanks dropped.
    pub fn tracked_devices(&self) -> Vec<&str> {
        self.device_list
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// Whether `module` is enabled and supported by the configured model.
    pub fn polls(&self, module: Module) -> bool {
        self.modules.contains(&module) && crate::features::module_supported(&self.model, module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_interval_defaults_and_clamps() {
        assert_eq!(normalize_scan_interval("60"), 60);
        assert_eq!(normalize_scan_interval("5"), MIN_SCAN_INTERVAL_SECS);
        assert_eq!(normalize_scan_interval("-10"), MIN_SCAN_INTERVAL_SECS);
        assert_eq!(normalize_scan_interval("86400"), MAX_SCAN_INTERVAL_SECS);
        assert_eq!(normalize_scan_interval(" 120 "), 120);
        assert_eq!(normalize_scan_interval("soon"), DEFAULT_SCAN_INTERVAL_SECS);
        assert_eq!(normalize_scan_interval(""), DEFAULT_SCAN_INTERVAL_SECS);
    }

    #[test]
    fn device_list_skips_blanks() {
        let config = RouterConfig {
            device_list: " aa:bb:cc:dd:ee:ff, ,laptop,".into(),
            ..RouterConfig::default()
        };
        assert_eq!(config.tracked_devices(), vec!["aa:bb:cc:dd:ee:ff", "laptop"]);
    }

    #[test]
    fn bare_host_becomes_https_url() {
        let config = RouterConfig::default();
        let url = config.base_url().expect("url");
        assert_eq!(url.as_str(), "https://192.168.10.1/");
    }

    #[test]
    fn gated_modules_are_not_polled() {
        let config = RouterConfig {
            model: "WR3000S V1.0".into(),
            ..RouterConfig::default()
        };
        assert!(!config.polls(Module::Modem));
        assert!(!config.polls(Module::Sms));
        assert!(config.polls(Module::System));
        assert!(config.polls(Module::Wan));
        assert!(!RouterConfig::default().polls(Module::Wan));
    }
}
