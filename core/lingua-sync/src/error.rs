//! Error types for the sync layer.

use lingua_remote::RemoteError;
use lingua_store::StoreError;
use std::sync::Arc;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
///
/// Missing resources are `Option`s and conflicts are always settled by the
/// configured policy, so neither has a variant here.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed input, rejected before any I/O.
    #[error("validation error: {0}")]
    Validation(String),

    /// The remote service failed after retries.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// The content store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Build polling exceeded its ceiling.
    #[error("export build {build_id} timed out after {waited_secs}s")]
    Timeout { build_id: u64, waited_secs: u64 },

    /// A sync of the namespace is already running.
    #[error("sync already in progress for namespace {0}")]
    AlreadyInProgress(String),

    /// The remote build ended in a failed or canceled state.
    #[error("export build {build_id} ended as {status}")]
    BuildFailed { build_id: u64, status: String },

    /// A failure of a build shared with other namespaces.
    #[error("{0}")]
    Shared(Arc<SyncError>),
}

impl SyncError {
    /// Returns true if this is (or wraps) a build timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            SyncError::Timeout { .. } => true,
            SyncError::Shared(inner) => inner.is_timeout(),
            _ => false,
        }
    }
}

impl From<lingua_types::Error> for SyncError {
    fn from(err: lingua_types::Error) -> Self {
        SyncError::Validation(err.to_string())
    }
}
