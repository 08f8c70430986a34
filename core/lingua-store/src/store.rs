//! Content store abstraction.
//!
//! A content store combines the human-edited file tree (static entries) and
//! the table of runtime-created entries (dynamic entries) behind one
//! interface keyed by `(language, namespace, key)`.

use crate::error::StoreResult;
use crate::layout::{self, KeyPrefix};
use async_trait::async_trait;
use lingua_types::Translation;
use std::path::Path;
use tracing::debug;

/// A default translation file shipped with a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultFile {
    /// Path relative to the namespace directory.
    pub file: String,
    /// Raw document.
    pub contents: String,
}

impl DefaultFile {
    /// Creates a default file, checking its relative path.
    pub fn new(file: &str, contents: impl Into<String>) -> StoreResult<Self> {
        Ok(Self {
            file: layout::normalize_file(file)?,
            contents: contents.into(),
        })
    }

    /// Reads every translation file under `dir`, recursively.
    pub async fn read_dir(dir: &Path) -> StoreResult<Vec<Self>> {
        let mut files = Vec::new();
        for relative in list_translation_files(dir).await? {
            let contents = tokio::fs::read_to_string(dir.join(&relative)).await?;
            files.push(Self {
                file: relative,
                contents,
            });
        }
        debug!("Read {} default files from {}", files.len(), dir.display());
        Ok(files)
    }
}

/// Lists translation files under `dir` as sorted `/`-separated relative paths.
///
/// A missing directory lists as empty.
pub async fn list_translation_files(dir: &Path) -> StoreResult<Vec<String>> {
    let mut files = Vec::new();
    let mut pending = vec![(dir.to_path_buf(), String::new())];
    while let Some((path, relative)) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let child = if relative.is_empty() {
                name.clone()
            } else {
                format!("{relative}/{name}")
            };
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push((entry.path(), child));
            } else if file_type.is_file() && layout::has_translation_extension(&name) {
                files.push(child);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Storage for translation entries.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Loads every entry of `namespace` across all languages.
    async fn load_all_entries(&self, namespace: &str) -> StoreResult<Vec<Translation>>;

    /// Loads a single entry.
    async fn get(
        &self,
        language: &str,
        namespace: &str,
        key: &str,
    ) -> StoreResult<Option<Translation>>;

    /// Writes entries into one file of `(language, namespace)`, keeping the
    /// file's other keys. Keys are full keys; the file prefix is stripped.
    async fn write_file(
        &self,
        language: &str,
        namespace: &str,
        file: &str,
        entries: &[Translation],
    ) -> StoreResult<()>;

    /// Writes one entry into `file`.
    async fn write(&self, file: &str, translation: &Translation) -> StoreResult<()> {
        self.write_file(
            &translation.language,
            &translation.namespace,
            file,
            std::slice::from_ref(translation),
        )
        .await
    }

    /// Inserts or replaces a runtime-created entry.
    async fn put_dynamic(&self, translation: &Translation) -> StoreResult<()>;

    /// Removes an entry, dynamic first, then from the file holding it.
    /// Returns false if nothing was removed.
    async fn delete(&self, language: &str, namespace: &str, key: &str) -> StoreResult<bool>;

    /// Files of `(language, namespace)` with the prefixes they own.
    async fn key_prefixes(&self, language: &str, namespace: &str) -> StoreResult<Vec<KeyPrefix>>;

    /// Languages that have a directory for `namespace`, sorted.
    async fn languages(&self, namespace: &str) -> StoreResult<Vec<String>>;

    /// Returns true if the source-language tree of `namespace` exists.
    async fn exists(&self, namespace: &str) -> StoreResult<bool>;

    /// Writes default source-language files that are not present yet.
    /// Returns the number of files created.
    async fn create_defaults(&self, namespace: &str, files: &[DefaultFile]) -> StoreResult<usize>;
}
