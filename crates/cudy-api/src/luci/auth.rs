// LuCI authentication
//
// Two login flows exist across Cudy firmware generations. Newer builds
// (5G routers such as the P5) serve a login form with a salt and a token
// and expect a double SHA-256 of the password. Older builds accept the
// plain password on `/cgi-bin/luci`. Both leave a `sysauth` cookie in the
// jar on success.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, ORIGIN, REFERER};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::luci::client::{LuciClient, SessionState};
use crate::parse::hidden_input;

/// Pause before the second salted attempt; tokens rotate on some builds.
const SALTED_RETRY_DELAY: Duration = Duration::from_millis(400);

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Lowercase hex SHA-256 of a UTF-8 string.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Password digest expected by the salted login form.
///
/// `sha256(sha256(password + salt) + token)`, or the inner hash alone when
/// the form carries no token.
pub fn luci_password_hash(password: &str, salt: &str, token: &str) -> String {
    let inner = sha256_hex(&format!("{password}{salt}"));
    if token.is_empty() {
        inner
    } else {
        sha256_hex(&format!("{inner}{token}"))
    }
}

impl LuciClient {
    /// Open a fresh session with the configured credentials.
    ///
    /// Clears any existing cookies, tries the salted flow twice, then falls
    /// back to the legacy flow. Credentials the router rejects yield
    /// `Error::Authentication`; an unreachable router yields the transport
    /// error from the last attempt.
    pub async fn login(&self) -> Result<(), Error> {
        let _guard = self.auth_lock.lock().await;
        if self.session_state() == SessionState::Unloaded {
            return Err(Error::SessionExpired);
        }

        self.cookie_jar().clear();
        self.set_session_state(SessionState::Unauthenticated);

        for attempt in 0..2 {
            if attempt > 0 {
                tokio::time::sleep(SALTED_RETRY_DELAY).await;
            }
            match self.login_salted().await {
                Ok(true) => {
                    self.set_session_state(SessionState::Authenticated);
                    debug!("login successful");
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => debug!(error = %e, "salted login attempt failed"),
            }
        }

        debug!("salted login failed, trying legacy login");
        if self.login_legacy().await? {
            self.set_session_state(SessionState::Authenticated);
            debug!("legacy login successful");
            Ok(())
        } else {
            Err(Error::Authentication {
                message: format!("router rejected credentials for user '{}'", self.username()),
            })
        }
    }

    /// `GET /cgi-bin/luci/` for the form, then `POST` the hashed password.
    async fn login_salted(&self) -> Result<bool, Error> {
        let url = self.luci_url("")?;
        let origin = self.origin();
        debug!("logging in at {}", url);

        // The form page may answer 403 and still carry the hidden fields.
        let resp = self
            .http()
            .get(url.clone())
            .header(ACCEPT, HTML_ACCEPT)
            .header(REFERER, format!("{origin}/"))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        let html = resp.text().await.map_err(|e| self.transport_error(e))?;

        let csrf = hidden_input(&html, "_csrf").unwrap_or_default();
        let (Some(token), Some(salt)) = (hidden_input(&html, "token"), hidden_input(&html, "salt"))
        else {
            debug!(%status, "login page carries no salt/token");
            return Ok(false);
        };

        let hashed = luci_password_hash(self.password().expose_secret(), &salt, &token);
        let form = [
            ("_csrf", csrf.as_str()),
            ("token", token.as_str()),
            ("salt", salt.as_str()),
            ("luci_username", self.username()),
            ("luci_password", hashed.as_str()),
            ("zonename", "UTC"),
            ("timeclock", "0"),
        ];

        let resp = self
            .http()
            .post(url)
            .header(ACCEPT, HTML_ACCEPT)
            .header(REFERER, format!("{origin}/"))
            .header(ORIGIN, &origin)
            .form(&form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let authenticated = self.session_cookie().is_some();
        if !authenticated {
            debug!(status = %resp.status(), "no session cookie after salted login");
        }
        Ok(authenticated)
    }

    /// `POST /cgi-bin/luci` with the plain password.
    async fn login_legacy(&self) -> Result<bool, Error> {
        let url = Url::parse(&format!("{}/cgi-bin/luci", self.origin()))?;
        let form = [
            ("luci_username", self.username()),
            ("luci_password", self.password().expose_secret()),
            ("luci_language", "en"),
        ];

        let resp = self
            .http()
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        let accepted = status.is_success() || status == StatusCode::FOUND;
        Ok(accepted && self.session_cookie().is_some())
    }
}
