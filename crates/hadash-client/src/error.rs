//! Error types for data sourcing and state reconciliation

use thiserror::Error;

/// Errors surfaced to callers of `load_data` and `update_state`
///
/// Storage faults never appear here; the owning components absorb them
/// and fall back to defaults.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Socket establishment failed
    #[error("websocket connect failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    /// The server rejected the access token
    #[error("authentication rejected: {0}")]
    AuthFailed(String),

    /// The connection went away while a command was in flight
    #[error("connection closed")]
    ConnectionClosed,

    /// The server answered a command with `success: false`
    #[error("command failed ({code}): {message}")]
    Command { code: String, message: String },

    /// The server sent something outside the expected protocol
    #[error("unexpected message from server: {0}")]
    Protocol(String),

    /// A payload did not match its expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
