//! Error types for the store layer.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A translation file could not be parsed or rendered.
    #[error("YAML error in {file}: {source}")]
    Yaml {
        file: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// JSON (dynamic table, ledger, backup) error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A translation file has an unexpected shape.
    #[error("malformed file {file}: {reason}")]
    Malformed { file: String, reason: String },

    /// A relative path escapes the store root or has the wrong extension.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// An entry failed validation before any I/O.
    #[error("validation error: {0}")]
    Validation(#[from] lingua_types::Error),
}

impl StoreError {
    pub(crate) fn yaml(file: impl Into<String>, source: serde_yaml::Error) -> Self {
        StoreError::Yaml {
            file: file.into(),
            source,
        }
    }
}
