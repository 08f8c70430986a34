//! Core type definitions for lingua.
//!
//! This crate defines the store-agnostic types shared by every layer of the
//! localization engine:
//! - Server and sync-session identifiers (UUID v7)
//! - Translations, plural forms and the origin tag of each entry
//! - Content hashes used to detect local/remote divergence
//!
//! Nothing in here performs I/O.

mod hash;
mod ids;
mod plural;
mod translation;

pub use hash::ContentHash;
pub use ids::{ServerId, SessionId};
pub use plural::{PluralCategory, PluralForms};
pub use translation::{EntryOrigin, Translation, full_key};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing or validating types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("unknown plural category: {0}")]
    UnknownPluralCategory(String),

    #[error("plural forms must contain an \"other\" form")]
    MissingOtherForm,

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
