//! Key-prefix layout of a namespace directory.
//!
//! Each file under `<language>/<namespace>/` contributes a key prefix derived
//! from its relative path: `menu.yml` holds `menu.*`, `gui/shop.yml` holds
//! `gui.shop.*`. The namespace-root `main.yml` holds unprefixed keys.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// File name whose keys carry no prefix.
pub const MAIN_FILE: &str = "main.yml";

/// Extensions recognised as translation files.
pub const EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// A file of a namespace and the key prefix it owns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyPrefix {
    /// Prefix including the trailing dot, or empty for `main.yml`.
    pub prefix: String,
    /// Path relative to the namespace directory, `/`-separated.
    pub file: String,
}

impl KeyPrefix {
    /// Builds the prefix entry for a relative file path.
    pub fn for_file(file: &str) -> StoreResult<Self> {
        Ok(Self {
            prefix: key_prefix_for_file(file)?,
            file: file.to_string(),
        })
    }

    /// Returns true if `key` belongs to this file.
    #[must_use]
    pub fn owns(&self, key: &str) -> bool {
        key.len() > self.prefix.len() && key.starts_with(&self.prefix)
    }

    /// Strips the prefix from a full key.
    #[must_use]
    pub fn local_key<'a>(&self, key: &'a str) -> &'a str {
        key.strip_prefix(self.prefix.as_str()).unwrap_or(key)
    }
}

/// Normalises and checks a relative file path.
pub fn normalize_file(file: &str) -> StoreResult<String> {
    let normalized = file.replace('\\', "/");
    let trimmed = normalized.trim_start_matches("./");
    if trimmed.is_empty()
        || trimmed.starts_with('/')
        || trimmed.split('/').any(|s| s.is_empty() || s == "." || s == "..")
    {
        return Err(StoreError::InvalidPath(file.to_string()));
    }
    if !has_translation_extension(trimmed) {
        return Err(StoreError::InvalidPath(format!(
            "{file} (expected .yml or .yaml)"
        )));
    }
    Ok(trimmed.to_string())
}

/// Returns true if the path ends in a recognised extension.
#[must_use]
pub fn has_translation_extension(file: &str) -> bool {
    file.rsplit_once('.')
        .is_some_and(|(_, ext)| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Computes the key prefix owned by a relative file path.
pub fn key_prefix_for_file(file: &str) -> StoreResult<String> {
    let file = normalize_file(file)?;
    if file == MAIN_FILE {
        return Ok(String::new());
    }
    let stem = file
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(&file);
    Ok(format!("{}.", stem.replace('/', ".")))
}

/// Picks the file owning `key`: the longest matching prefix, then `main.yml`
/// if the namespace has one.
#[must_use]
pub fn resolve_file<'a>(prefixes: &'a [KeyPrefix], key: &str) -> Option<&'a KeyPrefix> {
    prefixes
        .iter()
        .filter(|p| !p.prefix.is_empty() && p.owns(key))
        .max_by_key(|p| p.prefix.len())
        .or_else(|| prefixes.iter().find(|p| p.prefix.is_empty()))
}

/// Picks the file for `key`, falling back to `main.yml` when nothing matches.
#[must_use]
pub fn file_for_key(prefixes: &[KeyPrefix], key: &str) -> KeyPrefix {
    resolve_file(prefixes, key).cloned().unwrap_or_else(|| KeyPrefix {
        prefix: String::new(),
        file: MAIN_FILE.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_from_paths() {
        assert_eq!(key_prefix_for_file("main.yml").unwrap(), "");
        assert_eq!(key_prefix_for_file("menu.yml").unwrap(), "menu.");
        assert_eq!(key_prefix_for_file("gui/shop.yaml").unwrap(), "gui.shop.");
        assert_eq!(key_prefix_for_file("gui/main.yml").unwrap(), "gui.main.");
    }

    #[test]
    fn rejects_escaping_paths() {
        assert!(normalize_file("../x.yml").is_err());
        assert!(normalize_file("/abs.yml").is_err());
        assert!(normalize_file("a//b.yml").is_err());
        assert!(normalize_file("notes.txt").is_err());
        assert_eq!(normalize_file("./a\\b.yml").unwrap(), "a/b.yml");
    }

    #[test]
    fn longest_prefix_wins() {
        let prefixes = vec![
            KeyPrefix::for_file("main.yml").unwrap(),
            KeyPrefix::for_file("gui.yml").unwrap(),
            KeyPrefix::for_file("gui/shop.yml").unwrap(),
        ];
        assert_eq!(resolve_file(&prefixes, "gui.shop.title").unwrap().file, "gui/shop.yml");
        assert_eq!(resolve_file(&prefixes, "gui.close").unwrap().file, "gui.yml");
        assert_eq!(resolve_file(&prefixes, "greeting").unwrap().file, "main.yml");
        assert_eq!(resolve_file(&prefixes, "gui.").unwrap().file, "main.yml");
    }

    #[test]
    fn no_main_file_means_no_fallback() {
        let prefixes = vec![KeyPrefix::for_file("gui.yml").unwrap()];
        assert!(resolve_file(&prefixes, "other.key").is_none());
        assert_eq!(file_for_key(&prefixes, "other.key").file, MAIN_FILE);
    }
}
