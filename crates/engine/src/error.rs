//! Engine error types.

use thiserror::Error;

/// Errors surfaced by configuration loading and the websocket transport.
///
/// Simulation itself never returns errors: invalid intents and stale
/// broadcasts are ignored, and invariant violations are programming defects.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
