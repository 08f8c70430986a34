//! Content hashes for change detection.

use crate::PluralForms;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of digest bytes kept in a content hash.
const HASH_BYTES: usize = 16;

/// Short, stable digest of translation text.
///
/// Only equality matters: two entries with equal hashes are treated as
/// identical content during diffing and merging.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hashes plain text.
    #[must_use]
    pub fn of(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        Self(hex::encode(&digest[..HASH_BYTES]))
    }

    /// Hashes an entry's content: plural forms when present, text otherwise.
    #[must_use]
    pub fn of_entry(text: &str, plural_forms: Option<&PluralForms>) -> Self {
        let Some(forms) = plural_forms else {
            return Self::of(text);
        };
        let mut hasher = Sha256::new();
        for (category, form) in forms.iter() {
            hasher.update(category.as_str().as_bytes());
            hasher.update([0u8]);
            hasher.update(form.as_bytes());
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();
        Self(hex::encode(&digest[..HASH_BYTES]))
    }

    /// Wraps a previously recorded hash string.
    #[must_use]
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Returns the hex representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
