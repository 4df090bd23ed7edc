// Shared transport configuration for building reqwest::Client instances.
//
// LuCI keeps its session in a `sysauth` cookie and answers most form posts
// with a redirect, so clients built here carry a clearable cookie store and
// never follow redirects on their own.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use url::Url;

use crate::error::Error;

/// Desktop browser identity. Some firmware builds refuse the login form
/// to unknown agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// TLS verification mode (api-level mirror of core's TlsVerification).
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (routers ship self-signed certificates).
    DangerAcceptInvalid,
}

/// Cookie store whose contents can be dropped in one step.
///
/// `reqwest::cookie::Jar` has no way to forget cookies, and every login
/// attempt must start from an empty session.
#[derive(Debug, Default)]
pub struct SessionJar {
    inner: RwLock<Arc<Jar>>,
}

impl SessionJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every stored cookie.
    pub fn clear(&self) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(Jar::default());
    }

    /// Look up a single cookie value for `url` by name.
    pub fn get(&self, url: &Url, name: &str) -> Option<String> {
        let header = self.current().cookies(url)?;
        let raw = header.to_str().ok()?;
        raw.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_owned())
        })
    }

    fn current(&self) -> Arc<Jar> {
        Arc::clone(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.current().set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.current().cookies(url)
    }
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub cookie_jar: Option<Arc<SessionJar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(30),
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(BROWSER_USER_AGENT)
            .redirect(reqwest::redirect::Policy::none());

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        if let Some(ref jar) = self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Create a config with a fresh cookie jar (for session auth).
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(SessionJar::new()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleared_jar_forgets_session_cookie() {
        let jar = SessionJar::new();
        let url = Url::parse("http://192.168.10.1/cgi-bin/luci/").expect("url");
        let header = HeaderValue::from_static("sysauth=abc123; path=/");
        jar.set_cookies(&mut std::iter::once(&header), &url);

        assert_eq!(jar.get(&url, "sysauth").as_deref(), Some("abc123"));

        jar.clear();
        assert_eq!(jar.get(&url, "sysauth"), None);
    }
}
