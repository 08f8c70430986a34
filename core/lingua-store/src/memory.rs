//! In-memory content store.

use crate::codec::{self, FlatDocument, FlatValue};
use crate::dynamic::DynamicTable;
use crate::error::{StoreError, StoreResult};
use crate::layout::{self, KeyPrefix};
use crate::store::{ContentStore, DefaultFile};
use async_trait::async_trait;
use lingua_types::Translation;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// `(language, namespace)` → file → flattened document.
type Tree = BTreeMap<(String, String), BTreeMap<String, FlatDocument>>;

/// Content store holding its "files" in memory.
///
/// Behaves like the file-tree store, including key prefixes derived from
/// file names, without touching the disk.
pub struct MemoryContentStore {
    source_language: String,
    tree: RwLock<Tree>,
    dynamic: DynamicTable,
}

impl MemoryContentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(source_language: impl Into<String>) -> Self {
        Self {
            source_language: source_language.into(),
            tree: RwLock::new(Tree::new()),
            dynamic: DynamicTable::in_memory(),
        }
    }

    /// Seeds a file from a raw document.
    pub fn insert_document(
        &self,
        language: &str,
        namespace: &str,
        file: &str,
        contents: &str,
    ) -> StoreResult<()> {
        let file = layout::normalize_file(file)?;
        let document = codec::parse(&file, contents)?;
        self.tree
            .write()
            .entry((language.to_string(), namespace.to_string()))
            .or_default()
            .insert(file, document);
        Ok(())
    }

    /// Renders a stored file, if present.
    pub fn render_file(&self, language: &str, namespace: &str, file: &str) -> StoreResult<Option<String>> {
        let tree = self.tree.read();
        let Some(document) = tree
            .get(&(language.to_string(), namespace.to_string()))
            .and_then(|files| files.get(file))
        else {
            return Ok(None);
        };
        codec::render(file, document).map(Some)
    }

    /// Files of `(language, namespace)`, sorted.
    #[must_use]
    pub fn files(&self, language: &str, namespace: &str) -> Vec<String> {
        self.tree
            .read()
            .get(&(language.to_string(), namespace.to_string()))
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn load_all_entries(&self, namespace: &str) -> StoreResult<Vec<Translation>> {
        let mut by_key: HashMap<(String, String), Translation> = HashMap::new();
        {
            let tree = self.tree.read();
            for ((language, ns), files) in tree.iter() {
                if ns != namespace {
                    continue;
                }
                for (file, document) in files {
                    let prefix = layout::key_prefix_for_file(file)?;
                    for (key, value) in document {
                        let full = format!("{prefix}{key}");
                        let entry = value.clone().into_translation(namespace, &full, language);
                        by_key.insert((language.clone(), full), entry);
                    }
                }
            }
        }
        for entry in self.dynamic.namespace(namespace) {
            by_key.insert((entry.language.clone(), entry.key.clone()), entry);
        }
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
        let tree = self.tree.read();
        Ok(tree
            .get(&(language.to_string(), namespace.to_string()))
            .and_then(|files| files.get(&owner.file))
            .and_then(|document| document.get(owner.local_key(key)))
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
        let mut tree = self.tree.write();
        let document = tree
            .entry((language.to_string(), namespace.to_string()))
            .or_default()
            .entry(file)
            .or_default();
        for entry in entries {
            let local = entry.key.strip_prefix(prefix.as_str()).unwrap_or(&entry.key);
            document.insert(local.to_string(), FlatValue::of(entry));
        }
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
        let Some(owner) = layout::resolve_file(&prefixes, key) else {
            return Ok(false);
        };
        let mut tree = self.tree.write();
        Ok(tree
            .get_mut(&(language.to_string(), namespace.to_string()))
            .and_then(|files| files.get_mut(&owner.file))
            .is_some_and(|document| document.remove(owner.local_key(key)).is_some()))
    }

    async fn key_prefixes(&self, language: &str, namespace: &str) -> StoreResult<Vec<KeyPrefix>> {
        self.files(language, namespace)
            .iter()
            .map(|file| KeyPrefix::for_file(file))
            .collect()
    }

    async fn languages(&self, namespace: &str) -> StoreResult<Vec<String>> {
        let languages: BTreeSet<String> = self
            .tree
            .read()
            .keys()
            .filter(|(_, ns)| ns == namespace)
            .map(|(language, _)| language.clone())
            .collect();
        Ok(languages.into_iter().collect())
    }

    async fn exists(&self, namespace: &str) -> StoreResult<bool> {
        Ok(self
            .tree
            .read()
            .contains_key(&(self.source_language.clone(), namespace.to_string())))
    }

    async fn create_defaults(&self, namespace: &str, files: &[DefaultFile]) -> StoreResult<usize> {
        let existing = self.files(&self.source_language, namespace);
        let mut created = 0;
        for default in files {
            if existing.contains(&default.file) {
                continue;
            }
            self.insert_document(&self.source_language, namespace, &default.file, &default.contents)?;
            created += 1;
        }
        Ok(created)
    }
}
