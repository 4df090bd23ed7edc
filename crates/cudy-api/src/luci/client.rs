// LuCI HTTP client
//
// Wraps `reqwest::Client` with LuCI URL construction, the `sysauth`
// session cookie, and the fetch loop that re-authenticates when a page
// answers 403 or bounces to the login form. Login flows live in
// `auth.rs`, form actions in `actions.rs` and `mesh.rs`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use reqwest::StatusCode;
use secrecy::SecretString;
use tokio::sync::Mutex;
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::error::Error;
use crate::transport::{SessionJar, TransportConfig};

/// Name of the LuCI session cookie.
pub(crate) const SESSION_COOKIE: &str = "sysauth";

/// Attempts per page fetch. A 403 spends one attempt on re-authentication.
const FETCH_ATTEMPTS: u32 = 2;

/// Router address used when nothing else is configured.
pub const DEFAULT_HOST: &str = "192.168.10.1";

/// Login name used when nothing else is configured.
pub const DEFAULT_USERNAME: &str = "admin";

/// Lifecycle of the authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    /// The router rejected the cookie; the next fetch re-authenticates.
    Expired,
    /// The owner shut the session down. No further requests are made.
    Unloaded,
}

/// Build the router base URL from a user-supplied host.
///
/// Explicit `http://` / `https://` prefixes are kept (minus a trailing
/// slash); bare hosts get `https://`.
pub fn base_url_for_host(host: &str) -> Result<Url, Error> {
    let host = host.trim();
    let full = if host.starts_with("https://") || host.starts_with("http://") {
        host.trim_end_matches('/').to_owned()
    } else {
        format!("https://{host}")
    };
    Ok(Url::parse(&full)?)
}

/// LuCI answers some expired-session page loads with a redirect to the
/// login form at `/cgi-bin/luci/` instead of a 403.
pub(crate) fn is_login_redirect(resp: &reqwest::Response) -> bool {
    if !resp.status().is_redirection() {
        return false;
    }
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|location| {
            let path = location.split('?').next().unwrap_or(location);
            path.trim_end_matches('/').ends_with("/cgi-bin/luci")
        })
}

/// Raw HTTP client for a single router's LuCI interface.
///
/// One instance owns one session. Page fetches and form actions share the
/// cookie jar; re-authentication is serialised through an async lock so
/// concurrent callers never race two logins.
pub struct LuciClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    cookie_jar: Arc<SessionJar>,
    state: RwLock<SessionState>,
    reauth_count: AtomicU32,
    timeout_secs: u64,
    pub(crate) auth_lock: Mutex<()>,
}

impl LuciClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// If the config doesn't already include a cookie jar, one is created
    /// automatically (the session lives in a cookie).
    pub fn new(
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = config
            .cookie_jar
            .clone()
            .unwrap_or_else(|| Arc::new(SessionJar::new()));
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            username: username.into(),
            password,
            cookie_jar,
            state: RwLock::new(SessionState::Unauthenticated),
            reauth_count: AtomicU32::new(0),
            timeout_secs: config.timeout.as_secs(),
            auth_lock: Mutex::new(()),
        })
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The router base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &SecretString {
        &self.password
    }

    pub(crate) fn cookie_jar(&self) -> &SessionJar {
        &self.cookie_jar
    }

    /// A request timeout becomes [`Error::Timeout`] carrying the configured
    /// limit; everything else stays a transport error.
    pub(crate) fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }

    /// Current session lifecycle state.
    pub fn session_state(&self) -> SessionState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_session_state(&self, state: SessionState) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if *guard != SessionState::Unloaded {
            trace!(from = ?*guard, to = ?state, "session state change");
            *guard = state;
        }
    }

    /// How many times an expired session has been re-established.
    pub fn reauth_count(&self) -> u32 {
        self.reauth_count.load(Ordering::Relaxed)
    }

    /// The current `sysauth` cookie, if a session is open.
    ///
    /// LuCI scopes the cookie to `/cgi-bin/luci`, so it is looked up there.
    pub fn session_cookie(&self) -> Option<String> {
        let scope = self.luci_url("").ok()?;
        self.cookie_jar.get(&scope, SESSION_COOKIE)
    }

    /// Drop the session. Subsequent fetches fail with `SessionExpired`.
    pub fn unload(&self) {
        self.cookie_jar.clear();
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *guard = SessionState::Unloaded;
        debug!("session unloaded");
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Origin string used for `Origin` / `Referer` headers.
    pub(crate) fn origin(&self) -> String {
        self.base_url.as_str().trim_end_matches('/').to_owned()
    }

    /// `{base}/cgi-bin/luci/{path}`; `path` may carry a query string.
    pub(crate) fn luci_url(&self, path: &str) -> Result<Url, Error> {
        let full = format!("{}/cgi-bin/luci/{}", self.origin(), path.trim_start_matches('/'));
        Ok(Url::parse(&full)?)
    }

    // ── Page fetcher ─────────────────────────────────────────────────

    /// Fetch an admin page below `/cgi-bin/luci/`.
    ///
    /// A 403, or a redirect to the login form, means the session expired:
    /// the client re-authenticates once and retries; a second one in the
    /// same call is `SessionExpired`. Transient transport errors are retried
    /// within the same attempt budget. Any other non-success status, and
    /// exhausted retries, yield an empty body, which every parser reads as
    /// "all fields absent". One unreachable page never fails the caller.
    ///
    /// `silent` marks optional pages: their failures log at debug level
    /// instead of warn. A failed re-authentication is always an error.
    pub async fn get(&self, path: &str, silent: bool) -> Result<String, Error> {
        if self.session_state() == SessionState::Unloaded {
            return Err(Error::SessionExpired);
        }
        let url = self.luci_url(path)?;
        let referer = format!("{}/cgi-bin/luci/admin", self.origin());
        let mut last_error = None;
        let mut reauthenticated = false;

        for _ in 0..FETCH_ATTEMPTS {
            debug!("GET {}", url);
            let resp = match self
                .http
                .get(url.clone())
                .header(reqwest::header::REFERER, &referer)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    let err = self.transport_error(e);
                    debug!(error = %err, "GET {path} failed");
                    let retry = err.is_transient();
                    last_error = Some(err);
                    if retry {
                        continue;
                    }
                    break;
                }
            };

            let status = resp.status();
            if status == StatusCode::FORBIDDEN || is_login_redirect(&resp) {
                self.set_session_state(SessionState::Expired);
                if reauthenticated {
                    return Err(Error::SessionExpired);
                }
                reauthenticated = true;
                match self.reauthenticate().await {
                    Ok(()) => continue,
                    Err(e) => {
                        if !silent {
                            error!(error = %e, "re-authentication for {path} failed");
                        }
                        return Err(e);
                    }
                }
            }

            if status.is_success() {
                match resp.text().await {
                    Ok(body) => return Ok(body),
                    Err(e) => {
                        let err = self.transport_error(e);
                        debug!(error = %err, "reading {path} failed");
                        let retry = err.is_transient();
                        last_error = Some(err);
                        if retry {
                            continue;
                        }
                        break;
                    }
                }
            }

            debug!("GET {path} returned HTTP {status}");
            return Ok(String::new());
        }

        match last_error {
            Some(e) if !silent => warn!(error = %e, "no data retrieved from {path}"),
            _ => debug!("no data retrieved from {path}"),
        }
        Ok(String::new())
    }

    /// Make sure a session is open before a batch of requests.
    ///
    /// Logs in from `Unauthenticated`, re-authenticates from `Expired`, and
    /// refuses once the session is unloaded.
    pub async fn ensure_valid(&self) -> Result<(), Error> {
        match self.session_state() {
            SessionState::Authenticated => Ok(()),
            SessionState::Unauthenticated => self.login().await,
            SessionState::Expired => self.reauthenticate().await,
            SessionState::Unloaded => Err(Error::SessionExpired),
        }
    }

    /// Log in again after the router rejected the session cookie.
    pub(crate) async fn reauthenticate(&self) -> Result<(), Error> {
        self.login().await?;
        self.reauth_count.fetch_add(1, Ordering::Relaxed);
        debug!(count = self.reauth_count(), "session re-established");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_defaults_to_https() {
        let url = base_url_for_host("192.168.10.1").expect("url");
        assert_eq!(url.as_str(), "https://192.168.10.1/");
    }

    #[test]
    fn explicit_scheme_is_kept_without_trailing_slash() {
        let url = base_url_for_host("http://router.lan/").expect("url");
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_str(), Some("router.lan"));
    }

    #[test]
    fn luci_url_keeps_query_string() {
        let client = LuciClient::new(
            base_url_for_host("https://10.0.0.1").expect("url"),
            "admin",
            SecretString::from("pw"),
            &TransportConfig::default(),
        )
        .expect("client");
        let url = client
            .luci_url("admin/network/gcom/status?detail=1&iface=4g")
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://10.0.0.1/cgi-bin/luci/admin/network/gcom/status?detail=1&iface=4g"
        );
    }
}
