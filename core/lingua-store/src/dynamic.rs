//! Runtime-created entries.
//!
//! Dynamic entries are created through the API rather than authored in the
//! file tree. They are kept in a table persisted as JSON next to the tree.

use crate::error::StoreResult;
use lingua_types::{EntryOrigin, Translation};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

type EntryKey = (String, String, String);

fn entry_key(namespace: &str, language: &str, key: &str) -> EntryKey {
    (namespace.to_string(), language.to_string(), key.to_string())
}

/// Table of dynamic entries keyed by `(namespace, language, key)`.
#[derive(Debug, Default)]
pub struct DynamicTable {
    entries: RwLock<BTreeMap<EntryKey, Translation>>,
    path: Option<PathBuf>,
    write_lock: tokio::sync::Mutex<()>,
}

impl DynamicTable {
    /// Creates a table that lives only in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a table persisted at `path`, loading it if the file exists.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let mut entries = BTreeMap::new();
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let stored: Vec<Translation> = serde_json::from_slice(&bytes)?;
                for entry in stored {
                    let key = entry_key(&entry.namespace, &entry.language, &entry.key);
                    entries.insert(key, entry.with_origin(EntryOrigin::Database));
                }
                debug!("Loaded {} dynamic entries from {}", entries.len(), path.display());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(Self {
            entries: RwLock::new(entries),
            path: Some(path),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Persisted location, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Looks up one entry.
    #[must_use]
    pub fn get(&self, namespace: &str, language: &str, key: &str) -> Option<Translation> {
        self.entries
            .read()
            .get(&entry_key(namespace, language, key))
            .cloned()
    }

    /// Every entry of `namespace`.
    #[must_use]
    pub fn namespace(&self, namespace: &str) -> Vec<Translation> {
        self.entries
            .read()
            .iter()
            .filter(|((ns, _, _), _)| ns == namespace)
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    /// Inserts or replaces an entry and persists the table.
    pub async fn put(&self, translation: &Translation) -> StoreResult<()> {
        translation.validate()?;
        let entry = translation.clone().with_origin(EntryOrigin::Database);
        self.entries.write().insert(
            entry_key(&entry.namespace, &entry.language, &entry.key),
            entry,
        );
        self.persist().await
    }

    /// Removes an entry. Returns false if it was absent.
    pub async fn remove(&self, namespace: &str, language: &str, key: &str) -> StoreResult<bool> {
        let removed = self
            .entries
            .write()
            .remove(&entry_key(namespace, language, key))
            .is_some();
        if removed {
            self.persist().await?;
        }
        Ok(removed)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    async fn persist(&self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _guard = self.write_lock.lock().await;
        let json = {
            let entries = self.entries.read();
            let all: Vec<&Translation> = entries.values().collect();
            serde_json::to_vec_pretty(&all)?
        };
        write_atomic(path, &json).await
    }
}

/// Writes `bytes` to a sibling temp file, then renames it over `path`.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
