//! Error types for apilink.

use thiserror::Error;

/// Errors that can occur while building, dispatching, or decoding requests.
///
/// Every variant is delivered to the caller as a descriptive message via the
/// matching [`Completion`](crate::Completion) or session callback; none of
/// them aborts a worker task.
#[derive(Error, Debug)]
pub enum ApiLinkError {
    /// The endpoint URL could not be parsed. Raised at build time, before
    /// anything reaches the transport.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Connection, timeout, or I/O failure reported by the HTTP transport.
    /// The transport's own description passes through unchanged.
    #[error("{0}")]
    Transport(String),

    /// The transport call succeeded but the response carried no payload.
    #[error("Response body is null")]
    EmptyBody,

    /// The response payload was present but could not be decoded into the
    /// requested type.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// WebSocket failure at any lifecycle stage.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The outgoing payload could not be serialized to JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A file body could not be opened or read.
    #[error("I/O error: {0}")]
    Io(String),

    /// Invalid client or request configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for apilink operations.
pub type Result<T> = std::result::Result<T, ApiLinkError>;

impl From<reqwest::Error> for ApiLinkError {
    fn from(e: reqwest::Error) -> Self {
        ApiLinkError::Transport(e.to_string())
    }
}
