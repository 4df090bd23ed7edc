// LuCI form actions
//
// Every write goes through the same dance: load the CBI form page to pick
// up its anti-forgery `token`, then post the form back with the action's
// fields. Redirects are not followed, so a 302 is a normal success.

use reqwest::StatusCode;
use reqwest::header::{ORIGIN, REFERER};
use serde::Serialize;
use tracing::debug;

use crate::error::Error;
use crate::luci::client::{LuciClient, SessionState, is_login_redirect};
use crate::parse::{at_command_output, band_select_name, hidden_input};

/// Characters of the router's reply kept in an `ActionResponse`.
const RESPONSE_PREVIEW: usize = 220;

/// Characters kept when an AT reply has no output textarea.
const AT_RESPONSE_PREVIEW: usize = 500;

/// Router reply to a submitted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResponse {
    pub status: u16,
    pub body: String,
}

impl ActionResponse {
    /// A 2xx or a 302 back to the form means the router took the request.
    pub fn is_accepted(&self) -> bool {
        (200..300).contains(&self.status) || self.status == 302
    }
}

/// A CBI form page as served to the session.
pub(crate) struct FormPage {
    pub status: StatusCode,
    pub html: String,
    pub token: Option<String>,
}

/// Reject empty input before anything is sent.
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::Validation {
            field,
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

pub(crate) fn preview(body: &str, chars: usize) -> String {
    body.chars().take(chars).collect()
}

impl LuciClient {
    // ── Form plumbing ────────────────────────────────────────────────

    /// Load a form page, re-authenticating once if the session expired.
    ///
    /// A 403 and a redirect to the login form both count as expired.
    pub(crate) async fn form_page(&self, path: &str, referer: &str) -> Result<FormPage, Error> {
        if self.session_state() == SessionState::Unloaded {
            return Err(Error::SessionExpired);
        }
        let url = self.luci_url(path)?;
        let mut reauthenticated = false;
        loop {
            debug!("GET {}", url);
            let resp = self
                .http()
                .get(url.clone())
                .header(REFERER, referer)
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;
            let status = resp.status();
            let expired = status == StatusCode::FORBIDDEN || is_login_redirect(&resp);
            if expired && !reauthenticated {
                self.set_session_state(SessionState::Expired);
                reauthenticated = true;
                self.reauthenticate().await?;
                continue;
            }
            let html = resp.text().await.map_err(|e| self.transport_error(e))?;
            let token = hidden_input(&html, "token");
            return Ok(FormPage {
                status,
                html,
                token,
            });
        }
    }

    /// Post form fields back to `path` without following redirects.
    pub(crate) async fn submit_form(
        &self,
        path: &str,
        referer: &str,
        fields: &[(&str, &str)],
    ) -> Result<ActionResponse, Error> {
        let url = self.luci_url(path)?;
        debug!("POST {}", url);
        let resp = self
            .http()
            .post(url)
            .header(REFERER, referer)
            .header(ORIGIN, self.origin())
            .form(fields)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        Ok(ActionResponse { status, body })
    }

    /// Referer header value for a page below `/cgi-bin/luci/`.
    pub(crate) fn referer(&self, path: &str) -> String {
        format!("{}/cgi-bin/luci/{path}", self.origin())
    }

    /// Load `path`, then submit `token`, `timeclock`, `cbi.submit` and `extra`.
    async fn run_action(
        &self,
        action: &'static str,
        path: &str,
        referer_path: &str,
        extra: &[(&str, &str)],
    ) -> Result<ActionResponse, Error> {
        let referer = self.referer(referer_path);
        let page = self.form_page(path, &referer).await?;
        let token = page.token.ok_or_else(|| Error::Action {
            action,
            message: format!("no token on {path} (HTTP {})", page.status),
        })?;

        let mut fields = vec![("token", token.as_str()), ("timeclock", "0"), ("cbi.submit", "1")];
        fields.extend_from_slice(extra);

        let mut response = self.submit_form(path, &referer, &fields).await?;
        debug!(action, status = response.status, "form submitted");
        response.body = preview(&response.body, RESPONSE_PREVIEW);
        Ok(response)
    }

    // ── Router actions ───────────────────────────────────────────────

    /// Reboot the router.
    ///
    /// `POST admin/system/reboot/reboot`
    pub async fn reboot(&self) -> Result<ActionResponse, Error> {
        debug!("rebooting router");
        self.run_action(
            "reboot",
            "admin/system/reboot/reboot",
            "admin/panel",
            &[("cbi.apply", "OK")],
        )
        .await
    }

    /// Restart the cellular connection via the modem reset form.
    ///
    /// `POST admin/network/gcom/reset`
    pub async fn restart_5g_connection(&self) -> Result<ActionResponse, Error> {
        debug!("resetting modem");
        self.run_action(
            "modem reset",
            "admin/network/gcom/reset",
            "admin/network/gcom/status",
            &[("cbid.reset.1.reset", "Modem Reset")],
        )
        .await
    }

    /// Select a cellular band on the modem settings form.
    ///
    /// The select element is located by a `name` containing "band".
    /// `POST admin/network/gcom/setting`
    pub async fn switch_band(&self, band: &str) -> Result<ActionResponse, Error> {
        const PAGE: &str = "admin/network/gcom/setting";
        require("band", band)?;

        let referer = self.referer("admin");
        let page = self.form_page(PAGE, &referer).await?;
        let token = page.token.ok_or_else(|| Error::Action {
            action: "band switch",
            message: "no token on page".into(),
        })?;
        let select = band_select_name(&page.html).ok_or_else(|| Error::Action {
            action: "band switch",
            message: "no band select found".into(),
        })?;

        debug!(band, select = %select, "switching band");
        let fields = [
            ("token", token.as_str()),
            ("timeclock", "0"),
            ("cbi.submit", "1"),
            (select.as_str(), band),
        ];
        let mut response = self.submit_form(PAGE, &referer, &fields).await?;
        response.body = preview(&response.body, RESPONSE_PREVIEW);
        Ok(response)
    }

    /// Send an SMS through the modem.
    ///
    /// `POST admin/network/gcom/sms/smsnew?nomodal=&iface=4g`
    pub async fn send_sms(&self, phone_number: &str, message: &str) -> Result<ActionResponse, Error> {
        require("phone number", phone_number)?;
        require("message", message)?;

        debug!(chars = message.chars().count(), "sending SMS");
        self.run_action(
            "SMS send",
            "admin/network/gcom/sms/smsnew?nomodal=&iface=4g",
            "admin/network/gcom/sms",
            &[
                ("cbid.smsnew.1.phone", phone_number.trim()),
                ("cbid.smsnew.1.content", message),
                ("cbid.smsnew.1.send", "Send"),
            ],
        )
        .await
    }

    /// Run an AT command on the modem and return its output.
    ///
    /// The body of the response holds the modem's reply when the page
    /// echoes it in the `cbid.atcmd.1._custom` textarea, otherwise the
    /// start of the page.
    /// `POST admin/network/gcom/atcmd?embedded=&iface=4g`
    pub async fn send_at(&self, command: &str) -> Result<ActionResponse, Error> {
        const PAGE: &str = "admin/network/gcom/atcmd?embedded=&iface=4g";
        require("AT command", command)?;

        let referer = self.referer("admin/network/gcom/config");
        let page = self.form_page(PAGE, &referer).await?;
        let token = page.token.ok_or_else(|| Error::Action {
            action: "AT command",
            message: "no token on AT command page".into(),
        })?;

        debug!(command, "sending AT command");
        let fields = [
            ("token", token.as_str()),
            ("timeclock", "0"),
            ("cbi.submit", "1"),
            ("cbid.atcmd.1.command", command.trim()),
            ("cbid.atcmd.1.refresh", "AT Command"),
        ];
        let mut response = self.submit_form(PAGE, &referer, &fields).await?;
        response.body = at_command_output(&response.body)
            .unwrap_or_else(|| preview(&response.body, AT_RESPONSE_PREVIEW));
        Ok(response)
    }
}
