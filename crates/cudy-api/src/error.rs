use thiserror::Error;

/// Top-level error type for the `cudy-api` crate.
///
/// Covers session, transport, form-action, and page-shape failures.
/// `cudy-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, login form not recognised, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The router answered 403 and re-authentication did not restore access.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// No answer within the configured per-request timeout.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Actions ─────────────────────────────────────────────────────
    /// A LuCI form action could not be submitted.
    #[error("{action} failed: {message}")]
    Action {
        action: &'static str,
        message: String,
    },

    /// Required input was missing; nothing was sent to the router.
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// A page body could not be decoded (e.g. embedded JSON changed shape).
    #[error("Could not parse {page}: {message}")]
    Parse { page: String, message: String },
}

impl Error {
    /// Returns `true` if the page fetcher should try the request again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_retried_but_bad_input_is_not() {
        assert!(Error::Timeout { timeout_secs: 30 }.is_transient());
        assert!(
            !Error::Validation {
                field: "band",
                reason: "must not be empty".into(),
            }
            .is_transient()
        );
        assert!(!Error::SessionExpired.is_transient());
    }
}
