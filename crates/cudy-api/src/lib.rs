// cudy-api: Async Rust client for the Cudy router LuCI web interface

pub mod error;
pub mod luci;
pub mod parse;
pub mod transport;

pub use error::Error;
pub use luci::{ActionResponse, LuciClient, SessionState};
pub use transport::{SessionJar, TlsMode, TransportConfig};
