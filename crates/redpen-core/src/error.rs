//! Assessment source error types.
//!
//! These errors describe failures of a non-deterministic assessment source.
//! They live in `redpen-core` so the fallback service can downcast and
//! classify them for retry decisions without string matching.

use thiserror::Error;

/// Errors that can occur when talking to a remote assessment source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The source answered, but the payload does not have the required shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl SourceError {
    /// Returns `true` if retrying the same request cannot help.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            SourceError::AuthenticationFailed(_)
                | SourceError::ModelNotFound(_)
                | SourceError::MalformedPayload(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            SourceError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}
