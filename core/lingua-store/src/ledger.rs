//! Remote content-hash ledger.
//!
//! Records the hash of every entry last pushed to the remote service so an
//! upload only carries entries whose content changed since. The ledger can
//! be persisted as JSON so diffing survives restarts.

use crate::dynamic::write_atomic;
use crate::error::StoreResult;
use lingua_types::{ContentHash, Translation};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// namespace → language → key → hash
type Records = BTreeMap<String, BTreeMap<String, BTreeMap<String, ContentHash>>>;

/// Hashes last seen on the remote service.
#[derive(Debug, Default)]
pub struct HashLedger {
    records: RwLock<Records>,
    path: Option<PathBuf>,
    write_lock: tokio::sync::Mutex<()>,
}

impl HashLedger {
    /// Creates a ledger that lives only in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a ledger persisted at `path`, loading it if the file exists.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Records::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            records: RwLock::new(records),
            path: Some(path),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// The recorded hash of one entry.
    #[must_use]
    pub fn get(&self, namespace: &str, language: &str, key: &str) -> Option<ContentHash> {
        self.records
            .read()
            .get(namespace)?
            .get(language)?
            .get(key)
            .cloned()
    }

    /// Returns true if the entry's current content differs from the record.
    #[must_use]
    pub fn is_changed(&self, entry: &Translation) -> bool {
        self.get(&entry.namespace, &entry.language, &entry.key)
            .is_none_or(|recorded| recorded != entry.hash())
    }

    /// Filters `entries` down to those whose content changed.
    #[must_use]
    pub fn changed<'a, T>(&self, entries: &'a [T]) -> Vec<&'a T>
    where
        T: AsRef<Translation>,
    {
        let records = self.records.read();
        entries
            .iter()
            .filter(|entry| {
                let entry = entry.as_ref();
                records
                    .get(&entry.namespace)
                    .and_then(|languages| languages.get(&entry.language))
                    .and_then(|keys| keys.get(&entry.key))
                    .is_none_or(|recorded| *recorded != entry.hash())
            })
            .collect()
    }

    /// Records the current hash of every entry.
    pub fn record_all<'a>(&self, entries: impl IntoIterator<Item = &'a Translation>) {
        let mut records = self.records.write();
        let mut count = 0usize;
        for entry in entries {
            records
                .entry(entry.namespace.clone())
                .or_default()
                .entry(entry.language.clone())
                .or_default()
                .insert(entry.key.clone(), entry.hash());
            count += 1;
        }
        debug!("Recorded {} remote hashes", count);
    }

    /// Drops every record of `namespace`.
    pub fn forget_namespace(&self, namespace: &str) {
        self.records.write().remove(namespace);
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .values()
            .flat_map(|languages| languages.values())
            .map(BTreeMap::len)
            .sum()
    }

    /// Returns true if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the ledger to its file. A no-op for in-memory ledgers.
    pub async fn flush(&self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _guard = self.write_lock.lock().await;
        let json = serde_json::to_vec_pretty(&*self.records.read())?;
        write_atomic(path, &json).await
    }
}
