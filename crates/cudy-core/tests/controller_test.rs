#![allow(clippy::unwrap_used)]
// Integration tests for the poll collector and `Controller` against a
// wiremock router.

use std::collections::BTreeSet;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cudy_api::luci::luci_password_hash;
use cudy_api::parse::{NodeStatus, SmsStatus};
use cudy_core::{
    Command, CommandResult, ConnectionState, Controller, CoreError, Module, RouterConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

const LOGIN_FORM: &str = r#"<form method="post">
<input type="hidden" name="_csrf" value="csrf1"/>
<input type="hidden" name="token" value="tok1"/>
<input type="hidden" name="salt" value="salt1"/>
</form>"#;

const LAN_PAGE: &str = "<table>\
    <tr><td>IP Address</td><td>192.168.10.1</td></tr>\
    <tr><td>MAC-Address</td><td>80:AF:CA:00:00:01</td></tr>\
    </table>";

fn config_for(server: &MockServer, modules: &[Module]) -> RouterConfig {
    RouterConfig {
        host: server.uri(),
        password: SecretString::from("secret"),
        timeout: Duration::from_secs(2),
        scan_interval_secs: 0,
        modules: modules.iter().copied().collect::<BTreeSet<_>>(),
        ..RouterConfig::default()
    }
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_FORM))
        .mount(server)
        .await;

    let expected = luci_password_hash("secret", "salt1", "tok1");
    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci/"))
        .and(wiremock::matchers::body_string_contains(format!(
            "luci_password={expected}"
        )))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("set-cookie", "sysauth=session1; path=/cgi-bin/luci"),
        )
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/cgi-bin/luci/{page}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn connected(server: &MockServer, modules: &[Module]) -> Controller {
    mount_login(server).await;
    let controller = Controller::new(config_for(server, modules));
    controller.connect().await.unwrap();
    controller
}

// ── Connection lifecycle ────────────────────────────────────────────

#[tokio::test]
async fn test_connect_runs_first_poll() {
    let server = MockServer::start().await;
    mount_page(&server, "admin/network/lan/status", LAN_PAGE).await;

    let controller = connected(&server, &[Module::Lan]).await;

    assert_eq!(controller.state(), ConnectionState::Connected);
    let snapshot = controller.snapshot();
    assert!(snapshot.available);
    assert_eq!(snapshot.poll_count, 1);
    let lan = snapshot.data.lan.as_ref().unwrap();
    assert_eq!(lan.ip_address.as_deref(), Some("192.168.10.1"));
    assert!(snapshot.data.system.is_none());

    controller.disconnect().await;
}

#[tokio::test]
async fn test_bad_credentials_fail_setup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_FORM))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("bad password"))
        .mount(&server)
        .await;

    let controller = Controller::new(config_for(&server, &[Module::Lan]));
    let result = controller.connect().await;

    assert!(
        matches!(result, Err(CoreError::AuthenticationFailed { .. })),
        "got: {result:?}"
    );
    assert_eq!(controller.state(), ConnectionState::Failed);
}

#[tokio::test]
async fn test_slow_page_does_not_fail_the_poll() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/network/gcom/sms/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<th class=\"text-primary\">3</th>")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    mount_page(&server, "admin/network/lan/status", LAN_PAGE).await;

    let config = RouterConfig {
        timeout: Duration::from_millis(500),
        ..config_for(&server, &[Module::Sms, Module::Lan])
    };
    let controller = Controller::new(config);
    controller.connect().await.unwrap();

    let snapshot = controller.snapshot();
    assert!(snapshot.available);
    let lan = snapshot.data.lan.as_ref().unwrap();
    assert_eq!(lan.ip_address.as_deref(), Some("192.168.10.1"));
    assert_eq!(snapshot.data.sms, Some(SmsStatus::default()));

    controller.disconnect().await;
}

#[tokio::test]
async fn test_unreachable_router_is_connection_failure() {
    let config = RouterConfig {
        host: "http://127.0.0.1:1".into(),
        timeout: Duration::from_millis(200),
        ..RouterConfig::default()
    };
    let result = Controller::new(config).connect().await;
    assert!(
        matches!(result, Err(CoreError::ConnectionFailed { .. })),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn test_disconnect_unloads_session() {
    let server = MockServer::start().await;
    let controller = connected(&server, &[Module::Lan]).await;

    controller.disconnect().await;

    assert_eq!(controller.state(), ConnectionState::Unloaded);
    assert!(controller.session_state().await.is_none());
    let result = controller.execute(Command::Reboot).await;
    assert!(matches!(result, Err(CoreError::RouterDisconnected)));
}

#[tokio::test]
async fn test_failed_refresh_keeps_last_values_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/network/lan/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LAN_PAGE))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/network/lan/status"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let controller = connected(&server, &[Module::Lan]).await;
    let result = controller.refresh().await;

    assert!(matches!(result, Err(ref e) if e.is_auth()), "got: {result:?}");
    let snapshot = controller.snapshot();
    assert!(!snapshot.available);
    assert!(snapshot.last_error.is_some());
    assert_eq!(
        snapshot.data.lan.as_ref().unwrap().ip_address.as_deref(),
        Some("192.168.10.1")
    );

    controller.disconnect().await;
}

#[tokio::test]
async fn test_subscribers_see_manual_refresh() {
    let server = MockServer::start().await;
    mount_page(&server, "admin/network/lan/status", LAN_PAGE).await;
    let controller = connected(&server, &[Module::Lan]).await;

    let mut stream = controller.subscribe();
    assert_eq!(stream.current().poll_count, 1);

    let result = controller.execute(Command::Refresh).await.unwrap();
    assert_eq!(result, CommandResult::Refreshed);
    let next = stream.changed().await.unwrap();
    assert_eq!(next.poll_count, 2);

    controller.disconnect().await;
}

// ── Commands ────────────────────────────────────────────────────────

fn form_page(token: &str) -> String {
    format!(r#"<form><input type="hidden" name="token" value="{token}"/></form>"#)
}

#[tokio::test]
async fn test_reboot_is_accepted() {
    let server = MockServer::start().await;
    mount_page(&server, "admin/system/reboot/reboot", &form_page("rb1")).await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci/admin/system/reboot/reboot"))
        .respond_with(ResponseTemplate::new(302))
        .expect(1)
        .mount(&server)
        .await;

    let controller = connected(&server, &[Module::Lan]).await;
    let result = controller.execute(Command::Reboot).await.unwrap();

    assert_eq!(result, CommandResult::Accepted { status: 302 });
    controller.disconnect().await;
}

#[tokio::test]
async fn test_rejected_action_reports_status() {
    let server = MockServer::start().await;
    mount_page(&server, "admin/network/gcom/reset", &form_page("rs1")).await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/luci/admin/network/gcom/reset"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let controller = connected(&server, &[Module::Lan]).await;
    let result = controller.execute(Command::Restart5gConnection).await;

    match result {
        Err(CoreError::Rejected { action, status }) => {
            assert_eq!(action, "restart 5G connection");
            assert_eq!(status, 500);
        }
        other => panic!("expected Rejected, got: {other:?}"),
    }
    controller.disconnect().await;
}

#[tokio::test]
async fn test_empty_sms_fails_before_any_post() {
    let server = MockServer::start().await;
    let controller = connected(&server, &[Module::Lan]).await;
    let before = server.received_requests().await.unwrap().len();

    let result = controller
        .execute(Command::SendSms {
            phone_number: "  ".into(),
            message: "hello".into(),
        })
        .await;

    assert!(
        matches!(result, Err(CoreError::ValidationFailed { .. })),
        "got: {result:?}"
    );
    assert_eq!(server.received_requests().await.unwrap().len(), before);
    controller.disconnect().await;
}

#[tokio::test]
async fn test_oneshot_disconnects_afterwards() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_page(&server, "admin/network/lan/status", LAN_PAGE).await;

    let (state, ip) = Controller::oneshot(config_for(&server, &[Module::Lan]), |ctrl| async move {
        let snapshot = ctrl.snapshot();
        let ip = snapshot.data.lan.as_ref().and_then(|l| l.ip_address.clone());
        Ok((ctrl, ip))
    })
    .await
    .map(|(ctrl, ip)| (ctrl.state(), ip))
    .unwrap();

    assert_eq!(state, ConnectionState::Unloaded);
    assert_eq!(ip.as_deref(), Some("192.168.10.1"));
}

// ── Collector ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_disabled_modules_are_not_fetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/system/status"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let controller = connected(&server, &[Module::Lan]).await;
    controller.disconnect().await;
}

#[tokio::test]
async fn test_devices_fall_back_to_panel_counts() {
    let server = MockServer::start().await;
    mount_page(&server, "admin/network/devices/status", "<p>nothing here</p>").await;
    mount_page(
        &server,
        "admin/panel",
        "<table>\
         <tr><td>2.4G Clients</td><td>3</td></tr>\
         <tr><td>5G Clients</td><td>2</td></tr>\
         </table>",
    )
    .await;

    let controller = connected(&server, &[Module::Devices]).await;
    let devices = controller.snapshot().data.devices.clone().unwrap();

    assert_eq!(devices.clients.wifi_2g, Some(3));
    assert_eq!(devices.clients.wifi_5g, Some(2));
    assert_eq!(devices.clients.total, Some(5));
    controller.disconnect().await;
}

#[tokio::test]
async fn test_generic_wan_page_is_ignored() {
    let server = MockServer::start().await;
    mount_page(&server, "admin/network/wan/status", "<h1>Welcome</h1>").await;
    mount_login(&server).await;

    let config = RouterConfig {
        model: "WR3000S V1.0".into(),
        ..config_for(&server, &[Module::Wan])
    };
    let controller = Controller::new(config);
    controller.connect().await.unwrap();

    assert!(controller.snapshot().available);
    assert!(controller.snapshot().data.wan.is_none());
    controller.disconnect().await;
}

#[tokio::test]
async fn test_mesh_feed_and_fragments_merge() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "admin/network/mesh/clients",
        r#"[
            {"id":"000000000000","name":"Main","state":"connected","sysreport":{"ledstatus":"1"}},
            {"id":"80afca112233","name":"Attic","state":"connected",
             "sysreport":{"hardware":"RE1200 V1.0","firmware":"2.1.0","ipaddr":"192.168.10.3"}}
        ]"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/network/mesh/client/devstatus"))
        .and(query_param("client", "80afca112233"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<table><tr>
                <td><div id="cbi-table-1-content">Backhaul</div></td>
                <td><div id="cbi-table-1-data">Wired</div></td>
            </tr></table>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/luci/admin/network/mesh/client/devlist"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<table><tr id="cbi-table-1"><td>a</td></tr><tr id="cbi-table-2"><td>b</td></tr></table>"#,
        ))
        .mount(&server)
        .await;

    let controller = connected(&server, &[Module::Mesh]).await;
    let snapshot = controller.snapshot();
    let mesh = snapshot.data.mesh.as_ref().unwrap();

    assert_eq!(mesh.mesh_count, 1);
    assert_eq!(mesh.main_router_led_status.as_deref(), Some("1"));
    let node = &mesh.devices["80:AF:CA:11:22:33"];
    assert_eq!(node.name.as_deref(), Some("Attic"));
    assert_eq!(node.model.as_deref(), Some("RE1200"));
    assert_eq!(node.backhaul.as_deref(), Some("Wired"));
    assert_eq!(node.connected_devices, Some(2));
    assert_eq!(node.status, Some(NodeStatus::Online));
    controller.disconnect().await;
}

#[tokio::test]
async fn test_mesh_entities_follow_nodes() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "admin/network/mesh/clients",
        r#"[{"id":"80afca112233","name":"Attic","state":"connected","sysreport":{"ledstatus":"0"}}]"#,
    )
    .await;

    let controller = connected(&server, &[Module::Mesh]).await;
    let entities = controller.entities();

    let led = entities
        .iter()
        .find(|e| e.unique_id == "cudy-mesh-80:AF:CA:11:22:33-led")
        .unwrap();
    assert_eq!(
        led.turn(true),
        Some(Command::SetMeshLed {
            mac: "80:AF:CA:11:22:33".into(),
            enabled: true,
        })
    );
    assert!(entities.iter().any(|e| e.unique_id == "cudy-reboot"));
    controller.disconnect().await;
}
