//! Hot caches in front of the registry (L1) and the template compiler (L3).
//!
//! Both caches are bounded LRUs with an optional time-to-live, keyed by
//! `language:namespace:key`. Invalidation works per namespace (after a
//! reload or sync) or per key (after a targeted peer notification) and is
//! always a no-op for keys that are not cached.
//!
//! Every invalidation bumps the [`Generation`] of its namespace. Readers
//! take the generation before consulting the registry and insert with it,
//! so a value computed from a snapshot that was superseded mid-flight is
//! dropped instead of outliving the invalidation.

use crate::template::Template;
use dashmap::DashMap;
use lingua_types::PluralCategory;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache sizing and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum resolved strings kept in L1.
    pub resolved_capacity: usize,
    /// Maximum compiled templates kept in L3.
    pub template_capacity: usize,
    /// Entry lifetime in seconds; `None` disables expiry.
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            resolved_capacity: 10_000,
            template_capacity: 10_000,
            ttl_secs: Some(900),
        }
    }
}

/// Key of a cached value: `language:namespace:key`, plus the plural form
/// for templates compiled from one form of a plural entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    path: String,
    form: Option<PluralCategory>,
}

impl CacheKey {
    /// Builds the key for `(language, namespace, key)`.
    #[must_use]
    pub fn new(language: &str, namespace: &str, key: &str) -> Self {
        Self {
            path: format!("{language}:{namespace}:{key}"),
            form: None,
        }
    }

    /// Builds the key for one plural form.
    #[must_use]
    pub fn with_form(language: &str, namespace: &str, key: &str, form: PluralCategory) -> Self {
        Self {
            form: Some(form),
            ..Self::new(language, namespace, key)
        }
    }

    fn parts(&self) -> (&str, &str, &str) {
        let mut parts = self.path.splitn(3, ':');
        let language = parts.next().unwrap_or_default();
        let namespace = parts.next().unwrap_or_default();
        let key = parts.next().unwrap_or_default();
        (language, namespace, key)
    }

    /// Language segment.
    #[must_use]
    pub fn language(&self) -> &str {
        self.parts().0
    }

    /// Namespace segment.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.parts().1
    }

    /// Key segment.
    #[must_use]
    pub fn key(&self) -> &str {
        self.parts().2
    }

    /// Plural form, for template keys.
    #[must_use]
    pub fn form(&self) -> Option<PluralCategory> {
        self.form
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.form {
            Some(form) => write!(f, "{}#{}", self.path, form),
            None => f.write_str(&self.path),
        }
    }
}

/// Invalidation generation of one namespace, taken before a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
    cleared: u64,
    namespace: u64,
}

/// Hit/miss counters of one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub invalidated: u64,
    pub entries: usize,
}

#[derive(Debug)]
struct Slot<V> {
    value: V,
    inserted_at: Instant,
}

/// A bounded LRU with optional TTL.
pub struct BoundedCache<V> {
    entries: Mutex<LruCache<CacheKey, Slot<V>>>,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    invalidated: AtomicU64,
}

impl<V: Clone> BoundedCache<V> {
    /// Creates a cache holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired: AtomicU64::new(0),
            invalidated: AtomicU64::new(0),
        }
    }

    /// Returns a live value, dropping it if it has expired.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some(slot) if !self.is_expired(slot) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(slot.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
            self.expired.fetch_add(1, Ordering::Relaxed);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Inserts a value, evicting the least recently used entry when full.
    pub fn insert(&self, key: CacheKey, value: V) {
        self.entries.lock().put(
            key,
            Slot {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Inserts a value only if `still_current` holds while the cache is
    /// locked. Returns true if the value was stored.
    pub fn insert_if(
        &self,
        key: CacheKey,
        value: V,
        still_current: impl FnOnce(&CacheKey) -> bool,
    ) -> bool {
        let mut entries = self.entries.lock();
        if !still_current(&key) {
            return false;
        }
        entries.put(
            key,
            Slot {
                value,
                inserted_at: Instant::now(),
            },
        );
        true
    }

    /// Removes one key. Returns true if it was cached.
    pub fn remove(&self, key: &CacheKey) -> bool {
        let removed = self.entries.lock().pop(key).is_some();
        if removed {
            self.invalidated.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Drops every entry for `namespace`. Returns the number dropped.
    pub fn invalidate_namespace(&self, namespace: &str) -> usize {
        self.invalidate_where(|k| k.namespace() == namespace)
    }

    /// Drops every language and form of `namespace:key`.
    pub fn invalidate_key(&self, namespace: &str, key: &str) -> usize {
        self.invalidate_where(|k| k.namespace() == namespace && k.key() == key)
    }

    /// Drops every form of one `(language, namespace, key)`.
    pub fn invalidate_entry(&self, language: &str, namespace: &str, key: &str) -> usize {
        self.invalidate_where(|k| {
            k.language() == language && k.namespace() == namespace && k.key() == key
        })
    }

    fn invalidate_where(&self, matches: impl Fn(&CacheKey) -> bool) -> usize {
        let mut entries = self.entries.lock();
        let doomed: Vec<CacheKey> = entries
            .iter()
            .filter(|(k, _)| matches(k))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        self.invalidated
            .fetch_add(doomed.len() as u64, Ordering::Relaxed);
        doomed.len()
    }

    /// Drops everything.
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        self.invalidated.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Number of cached entries (expired ones included until touched).
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            invalidated: self.invalidated.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn is_expired(&self, slot: &Slot<V>) -> bool {
        self.ttl
            .is_some_and(|ttl| slot.inserted_at.elapsed() > ttl)
    }
}

/// The L1 resolved-string cache and the L3 template cache, invalidated together.
pub struct HotCache {
    resolved: BoundedCache<Arc<str>>,
    templates: BoundedCache<Arc<Template>>,
    generations: DashMap<String, u64>,
    cleared: AtomicU64,
}

impl HotCache {
    /// Creates both caches from configuration.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let ttl = config.ttl_secs.map(Duration::from_secs);
        Self {
            resolved: BoundedCache::new(config.resolved_capacity, ttl),
            templates: BoundedCache::new(config.template_capacity, ttl),
            generations: DashMap::new(),
            cleared: AtomicU64::new(0),
        }
    }

    /// Current invalidation generation of `namespace`.
    pub fn generation(&self, namespace: &str) -> Generation {
        Generation {
            cleared: self.cleared.load(Ordering::SeqCst),
            namespace: self.generations.get(namespace).map_or(0, |g| *g),
        }
    }

    // Must run before the matching entries are dropped.
    fn bump(&self, namespace: &str) {
        *self.generations.entry(namespace.to_string()).or_insert(0) += 1;
    }

    /// L1 lookup.
    pub fn resolved(&self, key: &CacheKey) -> Option<Arc<str>> {
        self.resolved.get(key)
    }

    /// L1 insert. Only placeholder-free resolutions belong here.
    pub fn put_resolved(&self, key: CacheKey, text: Arc<str>) {
        self.resolved.insert(key, text);
    }

    /// L1 insert, dropped if `namespace` was invalidated since `generation`
    /// was taken.
    pub fn put_resolved_at(&self, key: CacheKey, text: Arc<str>, generation: Generation) -> bool {
        self.resolved
            .insert_if(key, text, |k| self.generation(k.namespace()) == generation)
    }

    /// L3 lookup.
    pub fn template(&self, key: &CacheKey) -> Option<Arc<Template>> {
        self.templates.get(key)
    }

    /// L3 insert.
    pub fn put_template(&self, key: CacheKey, template: Arc<Template>) {
        self.templates.insert(key, template);
    }

    /// L3 insert with the same generation check as [`Self::put_resolved_at`].
    pub fn put_template_at(
        &self,
        key: CacheKey,
        template: Arc<Template>,
        generation: Generation,
    ) -> bool {
        self.templates
            .insert_if(key, template, |k| self.generation(k.namespace()) == generation)
    }

    /// Wipes everything cached under `namespace`.
    pub fn invalidate_namespace(&self, namespace: &str) -> usize {
        self.bump(namespace);
        let dropped =
            self.resolved.invalidate_namespace(namespace) + self.templates.invalidate_namespace(namespace);
        if dropped > 0 {
            debug!("Invalidated {} cached entries for namespace {}", dropped, namespace);
        }
        dropped
    }

    /// Wipes every language of `namespace:key`.
    pub fn invalidate_key(&self, namespace: &str, key: &str) -> usize {
        self.bump(namespace);
        self.resolved.invalidate_key(namespace, key) + self.templates.invalidate_key(namespace, key)
    }

    /// Wipes one `(language, namespace, key)`.
    pub fn invalidate_entry(&self, language: &str, namespace: &str, key: &str) -> usize {
        self.bump(namespace);
        self.resolved.invalidate_entry(language, namespace, key)
            + self.templates.invalidate_entry(language, namespace, key)
    }

    /// Wipes both caches.
    pub fn clear(&self) {
        self.cleared.fetch_add(1, Ordering::SeqCst);
        self.resolved.clear();
        self.templates.clear();
    }

    /// Counters of the resolved-string cache.
    pub fn resolved_stats(&self) -> CacheStats {
        self.resolved.stats()
    }

    /// Counters of the template cache.
    pub fn template_stats(&self) -> CacheStats {
        self.templates.stats()
    }
}

impl Default for HotCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}
