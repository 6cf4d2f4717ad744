//! Error taxonomy for completion clients.

use thiserror::Error;

/// Error type for completion operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// Filesystem or process I/O failed
    #[error("I/O failure during completion: {0}")]
    Io(#[from] std::io::Error),

    /// The total deadline elapsed before a reply arrived
    #[error("completion timed out after {0} seconds")]
    Timeout(u64),

    /// The waiting call was interrupted
    #[error("completion interrupted")]
    Interrupted,

    /// The completion task failed internally
    #[error("completion execution failed: {0}")]
    Execution(String),

    /// The endpoint answered with a non-success status
    #[error("completion endpoint returned status {status}: {body}")]
    Http { status: u16, body: String },

    /// The HTTP transport failed before a status was available
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The reply body did not match the expected wire shape
    #[error("malformed completion payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// The model identifier is outside the accepted set
    #[error("invalid model identifier: {0}")]
    InvalidModel(String),
}

/// Result type alias used throughout the library
pub type Result<T> = std::result::Result<T, LlmError>;
