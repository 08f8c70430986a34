//! File-tree content store.
//!
//! Layout: `<root>/<language>/<namespace>/<relative>.yml`. Static entries
//! are read from the tree on every load; dynamic entries live in a
//! [`DynamicTable`] and take precedence over a static entry with the same key.

use crate::codec::{self, FlatValue};
use crate::dynamic::{DynamicTable, write_atomic};
use crate::error::{StoreError, StoreResult};
use crate::layout::{self, KeyPrefix};
use crate::store::{ContentStore, DefaultFile, list_translation_files};
use async_trait::async_trait;
use lingua_types::Translation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Configuration for the file-tree store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Root of the translation tree.
    pub root: PathBuf,
    /// Language whose files are edited by hand.
    pub source_language: String,
    /// JSON file holding dynamic entries; `None` keeps them in memory.
    pub dynamic_path: Option<PathBuf>,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("lang"),
            source_language: "en_us".to_string(),
            dynamic_path: None,
        }
    }
}

/// Content store backed by a YAML file tree.
pub struct FileContentStore {
    config: FileStoreConfig,
    dynamic: DynamicTable,
    /// Serialises read-modify-write cycles on translation files.
    write_lock: Mutex<()>,
}

impl FileContentStore {
    /// Opens the store, loading the dynamic table if configured.
    pub async fn open(config: FileStoreConfig) -> StoreResult<Self> {
        let dynamic = match &config.dynamic_path {
            Some(path) => DynamicTable::open(path.clone()).await?,
            None => DynamicTable::in_memory(),
        };
        tokio::fs::create_dir_all(&config.root).await?;
        info!(
            "Opened file store at {} (source language {})",
            config.root.display(),
            config.source_language
        );
        Ok(Self {
            config,
            dynamic,
            write_lock: Mutex::new(()),
        })
    }

    /// Store configuration.
    #[must_use]
    pub fn config(&self) -> &FileStoreConfig {
        &self.config
    }

    /// The dynamic-entry table.
    #[must_use]
    pub fn dynamic(&self) -> &DynamicTable {
        &self.dynamic
    }

    fn namespace_dir(&self, language: &str, namespace: &str) -> PathBuf {
        self.config.root.join(language).join(namespace)
    }

    fn file_path(&self, language: &str, namespace: &str, file: &str) -> PathBuf {
        let mut path = self.namespace_dir(language, namespace);
        for segment in file.split('/') {
            path.push(segment);
        }
        path
    }

    async fn load_language(&self, language: &str, namespace: &str) -> StoreResult<Vec<Translation>> {
        let dir = self.namespace_dir(language, namespace);
        let mut entries = Vec::new();
        for file in list_translation_files(&dir).await? {
            let prefix = layout::key_prefix_for_file(&file)?;
            let contents = tokio::fs::read_to_string(dir.join(&file)).await?;
            let label = format!("{language}/{namespace}/{file}");
            entries.extend(codec::parse_entries(&label, &contents, namespace, language, &prefix)?);
        }
        Ok(entries)
    }

    async fn read_document(&self, path: &Path, label: &str) -> StoreResult<codec::FlatDocument> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => codec::parse(label, &contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(codec::FlatDocument::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ContentStore for FileContentStore {
    async fn load_all_entries(&self, namespace: &str) -> StoreResult<Vec<Translation>> {
        let mut by_key: HashMap<(String, String), Translation> = HashMap::new();
        let languages = self.languages(namespace).await?;
        for language in &languages {
            for entry in self.load_language(language, namespace).await? {
                by_key.insert((entry.language.clone(), entry.key.clone()), entry);
            }
        }
        for entry in self.dynamic.namespace(namespace) {
            by_key.insert((entry.language.clone(), entry.key.clone()), entry);
        }
        debug!(
            "Loaded {} entries for namespace {} ({} languages)",
            by_key.len(),
            namespace,
            languages.len()
        );
        Ok(by_key.into_values().collect())
    }

    async fn get(
        &self,
        language: &str,
        namespace: &str,
        key: &str,
    ) -> StoreResult<Option<Translation>> {
        if let Some(entry) = self.dynamic.get(namespace, language, key) {
            return Ok(Some(entry));
        }
        let prefixes = self.key_prefixes(language, namespace).await?;
        let Some(owner) = layout::resolve_file(&prefixes, key) else {
            return Ok(None);
        };
        let path = self.file_path(language, namespace, &owner.file);
        let document = self.read_document(&path, &owner.file).await?;
        Ok(document
            .get(owner.local_key(key))
            .cloned()
            .map(|value| value.into_translation(namespace, key, language)))
    }

    async fn write_file(
        &self,
        language: &str,
        namespace: &str,
        file: &str,
        entries: &[Translation],
    ) -> StoreResult<()> {
        let file = layout::normalize_file(file)?;
        let prefix = layout::key_prefix_for_file(&file)?;
        for entry in entries {
            entry.validate()?;
            if entry.language != language || entry.namespace != namespace {
                return Err(StoreError::Malformed {
                    file: file.clone(),
                    reason: format!("entry {} belongs to {}", entry.full_key(), entry.language),
                });
            }
        }

        let _guard = self.write_lock.lock().await;
        let path = self.file_path(language, namespace, &file);
        let mut document = self.read_document(&path, &file).await?;
        for entry in entries {
            let local = entry.key.strip_prefix(prefix.as_str()).unwrap_or(&entry.key);
            document.insert(local.to_string(), FlatValue::of(entry));
        }
        let rendered = codec::render(&file, &document)?;
        write_atomic(&path, rendered.as_bytes()).await?;
        debug!(
            "Wrote {} entries to {}/{}/{}",
            entries.len(),
            language,
            namespace,
            file
        );
        Ok(())
    }

    async fn put_dynamic(&self, translation: &Translation) -> StoreResult<()> {
        self.dynamic.put(translation).await
    }

    async fn delete(&self, language: &str, namespace: &str, key: &str) -> StoreResult<bool> {
        if self.dynamic.remove(namespace, language, key).await? {
            return Ok(true);
        }

        let prefixes = self.key_prefixes(language, namespace).await?;
        let Some(owner) = layout::resolve_file(&prefixes, key).cloned() else {
            return Ok(false);
        };
        let _guard = self.write_lock.lock().await;
        let path = self.file_path(language, namespace, &owner.file);
        let mut document = self.read_document(&path, &owner.file).await?;
        if document.remove(owner.local_key(key)).is_none() {
            return Ok(false);
        }
        let rendered = codec::render(&owner.file, &document)?;
        write_atomic(&path, rendered.as_bytes()).await?;
        Ok(true)
    }

    async fn key_prefixes(&self, language: &str, namespace: &str) -> StoreResult<Vec<KeyPrefix>> {
        list_translation_files(&self.namespace_dir(language, namespace))
            .await?
            .iter()
            .map(|file| KeyPrefix::for_file(file))
            .collect()
    }

    async fn languages(&self, namespace: &str) -> StoreResult<Vec<String>> {
        let mut languages = Vec::new();
        let mut dirs = match tokio::fs::read_dir(&self.config.root).await {
            Ok(dirs) => dirs,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(languages),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = dirs.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            if tokio::fs::try_exists(entry.path().join(namespace)).await? {
                languages.push(name);
            }
        }
        languages.sort();
        Ok(languages)
    }

    async fn exists(&self, namespace: &str) -> StoreResult<bool> {
        let dir = self.namespace_dir(&self.config.source_language, namespace);
        Ok(tokio::fs::try_exists(dir).await?)
    }

    async fn create_defaults(&self, namespace: &str, files: &[DefaultFile]) -> StoreResult<usize> {
        let language = self.config.source_language.clone();
        let mut created = 0;
        for default in files {
            let file = layout::normalize_file(&default.file)?;
            let path = self.file_path(&language, namespace, &file);
            if tokio::fs::try_exists(&path).await? {
                continue;
            }
            // Reject documents that would not load back.
            codec::parse(&file, &default.contents)?;
            write_atomic(&path, default.contents.as_bytes()).await?;
            created += 1;
        }
        if created > 0 {
            info!(
                "Created {} default files for namespace {} ({})",
                created, namespace, language
            );
        } else if files.is_empty() {
            warn!("No default files supplied for namespace {}", namespace);
        }
        Ok(created)
    }
}
