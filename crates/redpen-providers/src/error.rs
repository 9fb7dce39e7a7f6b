//! Source error types.
//!
//! The error enum itself lives in `redpen-core` so the fallback service can
//! classify failures; it is re-exported here for source implementations.

pub use redpen_core::error::SourceError;

/// Map a transport failure from `reqwest` onto a [`SourceError`].
pub(crate) fn from_transport(error: reqwest::Error, timeout_secs: u64) -> SourceError {
    if error.is_timeout() {
        SourceError::Timeout(timeout_secs)
    } else {
        SourceError::NetworkError(error.to_string())
    }
}
