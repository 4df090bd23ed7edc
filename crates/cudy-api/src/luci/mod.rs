// LuCI client: session, page fetcher, and form actions.

pub mod actions;
pub mod auth;
pub mod client;
pub mod mesh;

pub use actions::ActionResponse;
pub use auth::{luci_password_hash, sha256_hex};
pub use client::{DEFAULT_HOST, DEFAULT_USERNAME, LuciClient, SessionState, base_url_for_host};
