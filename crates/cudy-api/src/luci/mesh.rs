// Mesh node actions
//
// Mesh management pages differ between firmware builds. Each action walks
// a list of candidate pages and form layouts and stops at the first one
// the router accepts.

use tracing::{debug, error};

use crate::error::Error;
use crate::luci::actions::{ActionResponse, require};
use crate::luci::client::LuciClient;
use crate::parse::led_state_from_page;

const REBOOT_PAGES: [&str; 3] = [
    "admin/network/mesh/node",
    "admin/network/mesh/reboot",
    "admin/network/mesh/manage",
];

const LED_PAGES: [&str; 3] = [
    "admin/network/mesh/led",
    "admin/network/mesh/settings",
    "admin/system/led",
];

const LED_STATE_PAGES: [&str; 3] = [
    "admin/network/mesh/led",
    "admin/network/mesh/settings",
    "admin/network/mesh/status",
];

/// Mesh forms only count a plain 200 or a 302 as success.
fn mesh_accepted(status: u16) -> bool {
    matches!(status, 200 | 302)
}

impl LuciClient {
    /// Reboot one mesh node.
    ///
    /// Tries `mac`/`action`, then the CBI `cbid.mesh.1.*` fields, then
    /// `node_mac`/`reboot` on each candidate page.
    pub async fn reboot_mesh_node(&self, mac: &str) -> Result<ActionResponse, Error> {
        require("MAC address", mac)?;
        let referer = self.referer("admin/network/mesh");

        for page_path in REBOOT_PAGES {
            let Some(token) = self.mesh_form_token(page_path, &referer).await else {
                continue;
            };
            let patterns: [&[(&str, &str)]; 3] = [
                &[("mac", mac), ("action", "reboot")],
                &[("cbid.mesh.1.mac", mac), ("cbid.mesh.1.reboot", "Reboot")],
                &[("node_mac", mac), ("reboot", "1")],
            ];
            if let Some(status) = self.submit_patterns(page_path, &referer, &token, &patterns).await {
                debug!(mac, page = page_path, "mesh reboot accepted");
                return Ok(ActionResponse {
                    status,
                    body: format!("Reboot initiated for {mac}"),
                });
            }
        }

        error!(mac, "no mesh page accepted the reboot request");
        Err(Error::Action {
            action: "mesh reboot",
            message: format!("no working endpoint found for {mac}"),
        })
    }

    /// Switch the LEDs of one mesh node on or off.
    ///
    /// The last layout is the router-wide LED trigger, used by builds that
    /// have no per-node control.
    pub async fn set_mesh_led(&self, mac: &str, enabled: bool) -> Result<ActionResponse, Error> {
        require("MAC address", mac)?;
        let referer = self.referer("admin/network/mesh");
        let led_value = if enabled { "1" } else { "0" };
        let trigger = if enabled { "default-on" } else { "none" };
        let label = if enabled { "on" } else { "off" };

        for page_path in LED_PAGES {
            let Some(token) = self.mesh_form_token(page_path, &referer).await else {
                continue;
            };
            let patterns: [&[(&str, &str)]; 4] = [
                &[("mac", mac), ("led", led_value)],
                &[("cbid.led.1.enable", led_value), ("node_mac", mac)],
                &[("led_enable", led_value), ("mac_address", mac)],
                &[("cbid.system.led.trigger", trigger)],
            ];
            if let Some(status) = self.submit_patterns(page_path, &referer, &token, &patterns).await {
                debug!(mac, page = page_path, label, "mesh LED change accepted");
                return Ok(ActionResponse {
                    status,
                    body: format!("LED {label} for {mac}"),
                });
            }
        }

        error!(mac, "no mesh page accepted the LED request");
        Err(Error::Action {
            action: "mesh LED",
            message: format!("failed to set LED for mesh device {mac}"),
        })
    }

    /// Best-effort read of a mesh node's LED state. Defaults to on.
    pub async fn mesh_led_state(&self, mac: &str) -> Result<bool, Error> {
        require("MAC address", mac)?;
        let referer = self.referer("admin/network/mesh");

        for page_path in LED_STATE_PAGES {
            let page = match self.form_page(page_path, &referer).await {
                Ok(page) => page,
                Err(e) => {
                    debug!(error = %e, page = page_path, "LED state lookup failed");
                    continue;
                }
            };
            if page.status == reqwest::StatusCode::NOT_FOUND {
                continue;
            }
            if let Some(state) = led_state_from_page(&page.html, mac) {
                return Ok(state);
            }
        }
        Ok(true)
    }

    /// Token of a mesh form page, or `None` if the page is missing.
    async fn mesh_form_token(&self, path: &str, referer: &str) -> Option<String> {
        match self.form_page(path, referer).await {
            Ok(page) if page.status == reqwest::StatusCode::NOT_FOUND => None,
            Ok(page) => page.token,
            Err(e) => {
                debug!(error = %e, page = path, "mesh page unavailable");
                None
            }
        }
    }

    /// Submit each field layout in turn; return the first accepted status.
    async fn submit_patterns(
        &self,
        path: &str,
        referer: &str,
        token: &str,
        patterns: &[&[(&str, &str)]],
    ) -> Option<u16> {
        for extra in patterns {
            let mut fields = vec![("token", token), ("timeclock", "0"), ("cbi.submit", "1")];
            fields.extend_from_slice(extra);
            match self.submit_form(path, referer, &fields).await {
                Ok(resp) if mesh_accepted(resp.status) => return Some(resp.status),
                Ok(resp) => debug!(status = resp.status, page = path, "mesh form layout rejected"),
                Err(e) => {
                    debug!(error = %e, page = path, "mesh form submission failed");
                    return None;
                }
            }
        }
        None
    }
}
