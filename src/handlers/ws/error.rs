//! WebSocket error types and handling
//!
//! None of these end the session; they are logged and the offending
//! message is dropped.

use thiserror::Error;

/// WebSocket handler error types
#[derive(Debug, Error)]
pub enum WebSocketError {
    /// Frame is not a valid envelope
    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    /// Envelope is fine but the payload does not match its type
    #[error("Invalid {kind} payload: {error}")]
    InvalidPayload { kind: String, error: String },

    /// Audio chunk is not valid base64
    #[error("Invalid audio chunk: {0}")]
    InvalidAudio(String),
}

/// Result type for WebSocket operations
pub type WebSocketResult<T> = Result<T, WebSocketError>;
