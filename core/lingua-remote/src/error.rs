//! Remote service error types.

use std::time::Duration;
use thiserror::Error;

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors that can occur talking to the translation-management service.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("export build {build_id} timed out after {waited_secs}s")]
    Timeout { build_id: u64, waited_secs: u64 },

    #[error("export build {build_id} ended as {status}")]
    BuildFailed { build_id: u64, status: String },

    #[error("archive error: {0}")]
    Archive(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RemoteError {
    /// Returns true if this error represents a 429 rate-limit response.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            RemoteError::RateLimited { .. } => true,
            RemoteError::Api { status, .. } => *status == 429,
            RemoteError::Http(e) => e.status().is_some_and(|s| s.as_u16() == 429),
            _ => false,
        }
    }

    /// Returns true if repeating the request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::RateLimited { .. } => true,
            RemoteError::Api { status, .. } => *status == 429 || *status >= 500,
            RemoteError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            _ => false,
        }
    }

    /// Returns true for a 409 or a 400 complaining about an existing name.
    pub fn is_conflict(&self) -> bool {
        match self {
            RemoteError::Api { status: 409, .. } => true,
            RemoteError::Api {
                status: 400,
                message,
            } => {
                let message = message.to_ascii_lowercase();
                message.contains("already exists") || message.contains("must be unique")
            }
            _ => false,
        }
    }

    /// Returns the retry-after duration if this is a rate-limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            RemoteError::RateLimited { retry_after_secs } => {
                Some(Duration::from_secs(*retry_after_secs))
            }
            _ => None,
        }
    }
}
