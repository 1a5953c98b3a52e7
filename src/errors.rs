//! Crate-wide error types

use thiserror::Error;

/// Errors surfaced by merchant client operations
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A caller-supplied argument was missing or malformed. Raised before
    /// any frame is sent.
    #[error("Invalid argument: {0}")]
    Validation(String),

    #[error("You must authenticate to the websocket first")]
    NotAuthenticated,

    /// The server rejected the supplied API key.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The server acknowledged a request with an error. The message is the
    /// server's, verbatim.
    #[error("{0}")]
    RemoteOperation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// No acknowledgment arrived within the configured request timeout.
    #[error("Request '{event}' timed out waiting for acknowledgment")]
    Timeout { event: String },

    /// The transport's read loop has shut down and can no longer deliver
    /// an acknowledgment.
    #[error("Transport channel closed")]
    ChannelClosed,

    #[error("JSON parse error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

/// Result type for merchant client operations
pub type Result<T> = std::result::Result<T, Error>;
