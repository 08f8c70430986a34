//! The translation entry and its provenance.

use crate::{ContentHash, Error, PluralForms, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which store is authoritative for an entry.
///
/// Static entries come from the human-edited file tree, dynamic entries from
/// the relational store, and merged entries from the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrigin {
    #[default]
    File,
    Database,
    Remote,
}

/// A single localized string for `(namespace, key, language)`.
///
/// Entries are immutable once published to the registry; updates replace
/// the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    /// Owning namespace.
    pub namespace: String,
    /// Dot-separated key within the namespace.
    pub key: String,
    /// Local language code (e.g. `en_us`).
    pub language: String,
    /// Display text. Mirrors the `other` form for plural entries.
    pub text: String,
    /// Plural forms, if the entry is count-aware.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural_forms: Option<PluralForms>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Precomputed content hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<ContentHash>,
    /// Store that owns this entry.
    #[serde(default)]
    pub origin: EntryOrigin,
}

impl Translation {
    /// Creates a plain (non-plural) file-origin entry.
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        key: impl Into<String>,
        language: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            language: language.into(),
            text: text.into(),
            plural_forms: None,
            updated_at: Utc::now(),
            content_hash: None,
            origin: EntryOrigin::File,
        }
    }

    /// Creates a plural entry. `text` is taken from the `other` form.
    #[must_use]
    pub fn plural(
        namespace: impl Into<String>,
        key: impl Into<String>,
        language: impl Into<String>,
        forms: PluralForms,
    ) -> Self {
        let mut entry = Self::new(namespace, key, language, forms.other());
        entry.plural_forms = Some(forms);
        entry
    }

    /// Sets the origin tag.
    #[must_use]
    pub fn with_origin(mut self, origin: EntryOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Sets the modification time.
    #[must_use]
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Computes and stores the content hash.
    #[must_use]
    pub fn with_hash(mut self) -> Self {
        self.content_hash = Some(self.compute_hash());
        self
    }

    /// Returns the stored hash, or computes it.
    #[must_use]
    pub fn hash(&self) -> ContentHash {
        self.content_hash
            .clone()
            .unwrap_or_else(|| self.compute_hash())
    }

    fn compute_hash(&self) -> ContentHash {
        ContentHash::of_entry(&self.text, self.plural_forms.as_ref())
    }

    /// Returns true if both entries carry the same content.
    #[must_use]
    pub fn same_content(&self, other: &Translation) -> bool {
        self.hash() == other.hash()
    }

    /// Returns true if the entry has plural forms.
    #[must_use]
    pub fn is_plural(&self) -> bool {
        self.plural_forms.is_some()
    }

    /// Returns `namespace:key`.
    #[must_use]
    pub fn full_key(&self) -> String {
        full_key(&self.namespace, &self.key)
    }

    /// Checks structural invariants before the entry reaches any store.
    pub fn validate(&self) -> Result<()> {
        validate_segment("namespace", &self.namespace)?;
        validate_segment("language", &self.language)?;
        if self.key.is_empty() {
            return Err(Error::Invalid {
                field: "key",
                reason: "must not be empty".into(),
            });
        }
        if self.key.starts_with('.') || self.key.ends_with('.') || self.key.contains("..") {
            return Err(Error::Invalid {
                field: "key",
                reason: format!("malformed dotted key '{}'", self.key),
            });
        }
        if let Some(forms) = &self.plural_forms {
            if forms.other() != self.text {
                return Err(Error::Invalid {
                    field: "text",
                    reason: "must mirror the \"other\" plural form".into(),
                });
            }
        }
        Ok(())
    }
}

/// Joins a namespace and key as `namespace:key`.
#[must_use]
pub fn full_key(namespace: &str, key: &str) -> String {
    format!("{namespace}:{key}")
}

fn validate_segment(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::Invalid {
            field,
            reason: "must not be empty".into(),
        });
    }
    if value.contains([':', '/', '\\']) {
        return Err(Error::Invalid {
            field,
            reason: format!("'{value}' contains a reserved character"),
        });
    }
    if value == "." || value == ".." {
        return Err(Error::Invalid {
            field,
            reason: format!("'{value}' is not a valid name"),
        });
    }
    Ok(())
}
