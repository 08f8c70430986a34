//! Snapshot registry (L2).
//!
//! An immutable `language → namespace → key → Translation` index behind one
//! swappable pointer. Every mutation builds the next snapshot from the
//! current one, sharing untouched sub-maps, then replaces the pointer with
//! compare-and-swap (retrying if another writer got there first).

use arc_swap::ArcSwap;
use lingua_types::Translation;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

type KeyIndex = HashMap<String, Arc<Translation>>;
type NamespaceIndex = HashMap<String, Arc<KeyIndex>>;

/// One immutable view of every loaded translation.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    languages: HashMap<String, Arc<NamespaceIndex>>,
    version: u64,
}

impl Snapshot {
    /// Looks up a single entry.
    #[must_use]
    pub fn get(&self, language: &str, namespace: &str, key: &str) -> Option<&Arc<Translation>> {
        self.languages.get(language)?.get(namespace)?.get(key)
    }

    /// Monotonic version, bumped on every swap.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Languages with at least one entry, sorted.
    #[must_use]
    pub fn languages(&self) -> Vec<String> {
        let mut langs: Vec<String> = self.languages.keys().cloned().collect();
        langs.sort();
        langs
    }

    /// Every namespace present in any language.
    #[must_use]
    pub fn namespaces(&self) -> BTreeSet<String> {
        self.languages
            .values()
            .flat_map(|namespaces| namespaces.keys().cloned())
            .collect()
    }

    /// Languages that carry `namespace`, sorted.
    #[must_use]
    pub fn languages_of(&self, namespace: &str) -> Vec<String> {
        let mut langs: Vec<String> = self
            .languages
            .iter()
            .filter(|(_, namespaces)| namespaces.contains_key(namespace))
            .map(|(lang, _)| lang.clone())
            .collect();
        langs.sort();
        langs
    }

    /// Entries of one namespace in one language, sorted by key.
    #[must_use]
    pub fn entries(&self, namespace: &str, language: &str) -> Vec<Arc<Translation>> {
        let mut entries: Vec<Arc<Translation>> = self
            .languages
            .get(language)
            .and_then(|namespaces| namespaces.get(namespace))
            .map(|keys| keys.values().cloned().collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    /// Keys present in `source` but absent in `target` for `namespace`.
    #[must_use]
    pub fn missing_keys(&self, namespace: &str, source: &str, target: &str) -> Vec<String> {
        let Some(source_keys) = self
            .languages
            .get(source)
            .and_then(|namespaces| namespaces.get(namespace))
        else {
            return Vec::new();
        };
        let target_keys = self
            .languages
            .get(target)
            .and_then(|namespaces| namespaces.get(namespace));

        let mut missing: Vec<String> = source_keys
            .keys()
            .filter(|key| target_keys.is_none_or(|t| !t.contains_key(*key)))
            .cloned()
            .collect();
        missing.sort();
        missing
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.languages
            .values()
            .flat_map(|namespaces| namespaces.values())
            .map(|keys| keys.len())
            .sum()
    }

    /// Returns true if the snapshot holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    fn next(&self) -> Self {
        Self {
            languages: self.languages.clone(),
            version: self.version + 1,
        }
    }

    fn with_put(&self, entries: &[Arc<Translation>]) -> Self {
        let mut next = self.next();
        for entry in entries {
            let namespaces = Arc::make_mut(next.languages.entry(entry.language.clone()).or_default());
            let keys = Arc::make_mut(namespaces.entry(entry.namespace.clone()).or_default());
            keys.insert(entry.key.clone(), Arc::clone(entry));
        }
        next
    }

    fn with_removed(&self, language: &str, namespace: &str, key: &str) -> Option<Self> {
        self.get(language, namespace, key)?;

        let mut next = self.next();
        let namespaces_slot = next.languages.get_mut(language)?;
        let namespaces = Arc::make_mut(namespaces_slot);
        let keys_slot = namespaces.get_mut(namespace)?;
        let keys = Arc::make_mut(keys_slot);
        keys.remove(key);

        if keys.is_empty() {
            namespaces.remove(namespace);
        }
        if namespaces.is_empty() {
            next.languages.remove(language);
        }
        Some(next)
    }

    fn with_namespace(&self, namespace: &str, by_language: &HashMap<String, Arc<KeyIndex>>) -> Self {
        let mut next = self.next();

        let stale: Vec<String> = next
            .languages
            .iter()
            .filter(|(lang, namespaces)| {
                namespaces.contains_key(namespace) && !by_language.contains_key(*lang)
            })
            .map(|(lang, _)| lang.clone())
            .collect();
        for lang in stale {
            if let Some(slot) = next.languages.get_mut(&lang) {
                let namespaces = Arc::make_mut(slot);
                namespaces.remove(namespace);
                if namespaces.is_empty() {
                    next.languages.remove(&lang);
                }
            }
        }

        for (lang, keys) in by_language {
            let namespaces = Arc::make_mut(next.languages.entry(lang.clone()).or_default());
            namespaces.insert(namespace.to_string(), Arc::clone(keys));
        }
        next
    }
}

/// The authoritative in-process translation index.
#[derive(Debug, Default)]
pub struct Registry {
    current: ArcSwap<Snapshot>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// O(1) lookup against the current snapshot.
    #[must_use]
    pub fn get(&self, language: &str, namespace: &str, key: &str) -> Option<Arc<Translation>> {
        self.current.load().get(language, namespace, key).cloned()
    }

    /// Returns true if an entry exists at exactly `language`.
    #[must_use]
    pub fn contains(&self, language: &str, namespace: &str, key: &str) -> bool {
        self.current.load().get(language, namespace, key).is_some()
    }

    /// Returns the current snapshot. It stays valid and unchanged no matter
    /// how many swaps happen afterwards.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Inserts or replaces one entry.
    pub fn put(&self, translation: Translation) {
        self.put_all(vec![translation]);
    }

    /// Inserts or replaces several entries in one swap.
    pub fn put_all(&self, translations: Vec<Translation>) {
        if translations.is_empty() {
            return;
        }
        let entries: Vec<Arc<Translation>> = translations.into_iter().map(Arc::new).collect();
        self.current.rcu(|current| current.with_put(&entries));
        debug!("Registry put {} entries", entries.len());
    }

    /// Removes one entry, pruning empty sub-maps. Returns false if absent.
    pub fn remove(&self, language: &str, namespace: &str, key: &str) -> bool {
        let mut removed = false;
        self.current.rcu(|current| match current.with_removed(language, namespace, key) {
            Some(next) => {
                removed = true;
                Arc::new(next)
            }
            None => {
                removed = false;
                Arc::clone(current)
            }
        });
        removed
    }

    /// Replaces every language of `namespace` in one atomic step.
    ///
    /// Languages absent from `translations` lose the namespace entirely.
    /// Entries belonging to another namespace are ignored.
    pub fn reload_namespace(&self, namespace: &str, translations: Vec<Translation>) {
        let mut grouped: HashMap<String, KeyIndex> = HashMap::new();
        let mut total = 0usize;
        for translation in translations {
            if translation.namespace != namespace {
                warn!(
                    "Ignoring entry {} while reloading namespace {}",
                    translation.full_key(),
                    namespace
                );
                continue;
            }
            total += 1;
            grouped
                .entry(translation.language.clone())
                .or_default()
                .insert(translation.key.clone(), Arc::new(translation));
        }
        let by_language: HashMap<String, Arc<KeyIndex>> = grouped
            .into_iter()
            .map(|(lang, keys)| (lang, Arc::new(keys)))
            .collect();

        self.current
            .rcu(|current| current.with_namespace(namespace, &by_language));
        debug!(
            "Reloaded namespace {} ({} entries across {} languages)",
            namespace,
            total,
            by_language.len()
        );
    }

    /// Drops a namespace from every language.
    pub fn clear_namespace(&self, namespace: &str) {
        self.reload_namespace(namespace, Vec::new());
    }

    /// Languages with at least one entry.
    #[must_use]
    pub fn languages(&self) -> Vec<String> {
        self.current.load().languages()
    }

    /// Every loaded namespace.
    #[must_use]
    pub fn namespaces(&self) -> BTreeSet<String> {
        self.current.load().namespaces()
    }

    /// Entries of one namespace in one language, sorted by key.
    #[must_use]
    pub fn entries(&self, namespace: &str, language: &str) -> Vec<Arc<Translation>> {
        self.current.load().entries(namespace, language)
    }

    /// Keys present in `source` but missing in `target`.
    #[must_use]
    pub fn missing_keys(&self, namespace: &str, source: &str, target: &str) -> Vec<String> {
        self.current.load().missing_keys(namespace, source, target)
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    /// Returns true if nothing is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}
