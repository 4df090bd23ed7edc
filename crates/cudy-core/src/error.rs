// ── Core error types ──
//
// User-facing errors from cudy-core. Consumers never see reqwest errors or
// page-shape details directly; `From<cudy_api::Error>` folds transport
// failures into connection, timeout, and auth variants.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to router at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Router disconnected")]
    RouterDisconnected,

    #[error("Router did not answer within {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Router rejected {action} (HTTP {status})")]
    Rejected { action: String, status: u16 },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Router API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<cudy_api::Error> for CoreError {
    fn from(err: cudy_api::Error) -> Self {
        match err {
            cudy_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            cudy_api::Error::SessionExpired => CoreError::AuthenticationFailed {
                message: "Session expired -- the router keeps rejecting the login".into(),
            },
            cudy_api::Error::Transport(ref e) => {
                if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            cudy_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            cudy_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            cudy_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            cudy_api::Error::Action { action, message } => CoreError::OperationFailed {
                message: format!("{action}: {message}"),
            },
            cudy_api::Error::Validation { field, reason } => CoreError::ValidationFailed {
                message: format!("{field}: {reason}"),
            },
            cudy_api::Error::Parse { page, message } => CoreError::Api {
                message: format!("unexpected content on {page}: {message}"),
                status: None,
            },
        }
    }
}
