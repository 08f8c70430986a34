//! Locale mapping between local and remote code conventions.
//!
//! Local codes look like `en_us`, remote codes like `en-US`. Explicit
//! table entries win; anything else goes through a deterministic
//! case/separator transform so unconfigured locales still map.

use std::collections::{BTreeMap, HashMap};

/// Bidirectional locale-code mapper.
#[derive(Debug, Clone, Default)]
pub struct LocaleMapper {
    to_remote: HashMap<String, String>,
    to_local: HashMap<String, String>,
}

impl LocaleMapper {
    /// Creates a mapper from an explicit `local → remote` table.
    #[must_use]
    pub fn new(table: &BTreeMap<String, String>) -> Self {
        let mut mapper = Self::default();
        for (local, remote) in table {
            mapper.insert(local, remote);
        }
        mapper
    }

    /// Adds or replaces an explicit pair.
    pub fn insert(&mut self, local: &str, remote: &str) {
        self.to_remote
            .insert(local.to_ascii_lowercase(), remote.to_string());
        self.to_local
            .insert(remote.to_ascii_lowercase(), local.to_string());
    }

    /// Maps a local code to the remote convention.
    #[must_use]
    pub fn to_remote(&self, local: &str) -> String {
        self.to_remote
            .get(&local.to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| default_remote(local))
    }

    /// Maps a remote code to the local convention.
    #[must_use]
    pub fn to_local(&self, remote: &str) -> String {
        self.to_local
            .get(&remote.to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| default_local(remote))
    }

    /// Number of explicit pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.to_remote.len()
    }

    /// Returns true if no explicit pairs are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_remote.is_empty()
    }
}

/// `en_us` → `en-US`, `zh_hant_tw` → `zh-Hant-TW`.
#[must_use]
pub fn default_remote(local: &str) -> String {
    let mut parts = local.split(['_', '-']).filter(|p| !p.is_empty());
    let Some(language) = parts.next() else {
        return String::new();
    };
    let mut out = language.to_ascii_lowercase();
    for part in parts {
        out.push('-');
        if part.len() == 4 && part.chars().all(|c| c.is_ascii_alphabetic()) {
            let mut chars = part.chars();
            if let Some(first) = chars.next() {
                out.push(first.to_ascii_uppercase());
                out.push_str(&chars.as_str().to_ascii_lowercase());
            }
        } else {
            out.push_str(&part.to_ascii_uppercase());
        }
    }
    out
}

/// `en-US` → `en_us`.
#[must_use]
pub fn default_local(remote: &str) -> String {
    remote
        .split(['_', '-'])
        .filter(|p| !p.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}
