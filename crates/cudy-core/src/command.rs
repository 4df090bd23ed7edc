// ── Command API ──
//
// All router writes flow through `Command`. The controller's command task
// routes each variant to the matching LuCI form action and maps a
// non-accepted HTTP status to `CoreError::Rejected`.

use serde::Serialize;

use crate::error::CoreError;

/// A command envelope sent through the command channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// Every write operation the router supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ── Router ───────────────────────────────────────────────────────
    Reboot,
    Restart5gConnection,
    SwitchBand { band: String },
    SendSms { phone_number: String, message: String },
    SendAtCommand { command: String },

    // ── Mesh ─────────────────────────────────────────────────────────
    RebootMeshNode { mac: String },
    SetMeshLed { mac: String, enabled: bool },
    MeshLedState { mac: String },

    /// Poll now instead of waiting for the next interval.
    Refresh,
}

impl Command {
    /// Short name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reboot => "reboot",
            Self::Restart5gConnection => "restart 5G connection",
            Self::SwitchBand { .. } => "switch band",
            Self::SendSms { .. } => "send SMS",
            Self::SendAtCommand { .. } => "AT command",
            Self::RebootMeshNode { .. } => "reboot mesh node",
            Self::SetMeshLed { .. } => "set mesh LED",
            Self::MeshLedState { .. } => "read mesh LED",
            Self::Refresh => "refresh",
        }
    }

    /// Whether the command changes router state in a way worth confirming.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Self::Reboot | Self::Restart5gConnection | Self::SwitchBand { .. } | Self::RebootMeshNode { .. }
        )
    }
}

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandResult {
    /// The router accepted the form post.
    Accepted { status: u16 },
    /// Modem reply to an AT command.
    AtResponse { status: u16, output: String },
    LedState { mac: String, enabled: bool },
    Refreshed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destructive_commands_are_flagged() {
        assert!(Command::Reboot.is_destructive());
        assert!(
            Command::RebootMeshNode {
                mac: "80:AF:CA:11:22:33".into()
            }
            .is_destructive()
        );
        assert!(!Command::Refresh.is_destructive());
        assert!(
            !Command::SendAtCommand {
                command: "ATI".into()
            }
            .is_destructive()
        );
    }

    #[test]
    fn results_serialize_with_a_tag() {
        let results = vec![
            CommandResult::Accepted { status: 302 },
            CommandResult::LedState {
                mac: "80:AF:CA:11:22:33".into(),
                enabled: false,
            },
        ];
        insta::assert_json_snapshot!(results, @r#"
        [
          {
            "result": "accepted",
            "status": 302
          },
          {
            "result": "led_state",
            "mac": "80:AF:CA:11:22:33",
            "enabled": false
          }
        ]
        "#);
    }
}
