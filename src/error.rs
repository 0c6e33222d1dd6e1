//! Error types.

use thiserror::Error;

use crate::session::SessionState;

/// Errors surfaced by the automation core.
///
/// Rate-limit exhaustion is deliberately absent: it is an expected,
/// recoverable condition absorbed by [`crate::RateLimitGuard`] as a bounded
/// wait, never an error. A streaming disconnect is likewise surfaced as a
/// [`crate::StreamEvent::Disconnected`] event, terminal for that session.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The remote API returned an error response
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// A single API call failed; carries the operation name for diagnosis.
    /// Never retried by the executor.
    #[error("{operation} failed: {source}")]
    RequestFailed {
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// A session method was invoked in a state that forbids it
    #[error("cannot {operation} a stream session in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// Establishing the stream subscription failed
    #[error("stream error: {0}")]
    Stream(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for aviary operations.
pub type Result<T> = std::result::Result<T, Error>;
