//! Fallback-chain resolver.
//!
//! Lookup order: L1 (only when no placeholders are supplied), the registry
//! at the requested language, the registry at the default language, then
//! the missing-key format. Never fails and never performs I/O.

use crate::cache::{CacheKey, Generation, HotCache};
use crate::plural::category_for;
use crate::registry::Registry;
use crate::template::{Placeholders, Template};
use dashmap::DashSet;
use lingua_types::{PluralCategory, Translation, full_key};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// What to return when neither the requested nor the default language has a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "format", rename_all = "snake_case")]
pub enum MissingKeyPolicy {
    /// The bare `namespace:key`.
    #[default]
    Literal,
    /// A format with `{namespace}`, `{key}` and `{fullkey}` slots.
    Template(String),
}

impl MissingKeyPolicy {
    /// Renders the fallback text for a missing key.
    #[must_use]
    pub fn render(&self, namespace: &str, key: &str) -> String {
        match self {
            MissingKeyPolicy::Literal => full_key(namespace, key),
            MissingKeyPolicy::Template(format) => Template::compile(format).render(
                &Placeholders::new()
                    .with("namespace", namespace)
                    .with("key", key)
                    .with("fullkey", full_key(namespace, key)),
            ),
        }
    }
}

/// Resolver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Language consulted when the requested one has no entry.
    pub default_language: String,
    /// Fallback for keys missing in every language of the chain.
    pub missing_key: MissingKeyPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_language: "en_us".to_string(),
            missing_key: MissingKeyPolicy::Literal,
        }
    }
}

/// Missing keys already reported, so each one is logged once.
///
/// Shared between the resolver (which records) and whoever reloads
/// namespaces (which forgets, so a key that goes missing again after a
/// reload is reported again).
#[derive(Debug, Default)]
pub struct MissingKeyLog {
    seen: DashSet<String>,
}

impl MissingKeyLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `namespace:key`. Returns true the first time.
    pub fn record(&self, namespace: &str, key: &str) -> bool {
        self.seen.insert(full_key(namespace, key))
    }

    /// Forgets every key of `namespace`.
    pub fn forget_namespace(&self, namespace: &str) {
        let prefix = format!("{namespace}:");
        self.seen.retain(|k| !k.starts_with(&prefix));
    }

    /// Forgets everything.
    pub fn clear(&self) {
        self.seen.clear();
    }

    /// Number of distinct keys reported.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Resolves `(language, namespace, key)` to display text.
pub struct Resolver {
    registry: Arc<Registry>,
    cache: Arc<HotCache>,
    config: ResolverConfig,
    missing: Arc<MissingKeyLog>,
}

impl Resolver {
    /// Creates a resolver with its own missing-key log.
    #[must_use]
    pub fn new(registry: Arc<Registry>, cache: Arc<HotCache>, config: ResolverConfig) -> Self {
        Self::with_missing_log(registry, cache, config, Arc::new(MissingKeyLog::new()))
    }

    /// Creates a resolver that records into a shared missing-key log.
    #[must_use]
    pub fn with_missing_log(
        registry: Arc<Registry>,
        cache: Arc<HotCache>,
        config: ResolverConfig,
        missing: Arc<MissingKeyLog>,
    ) -> Self {
        Self {
            registry,
            cache,
            config,
            missing,
        }
    }

    /// The default language of the fallback chain.
    #[must_use]
    pub fn default_language(&self) -> &str {
        &self.config.default_language
    }

    /// The missing-key log.
    #[must_use]
    pub fn missing_log(&self) -> &Arc<MissingKeyLog> {
        &self.missing
    }

    /// Resolves a key and substitutes `placeholders`.
    #[must_use]
    pub fn resolve(
        &self,
        language: &str,
        namespace: &str,
        key: &str,
        placeholders: &Placeholders,
    ) -> String {
        let l1_key = CacheKey::new(language, namespace, key);
        if placeholders.is_empty() {
            if let Some(text) = self.cache.resolved(&l1_key) {
                return text.to_string();
            }
        }

        // Taken before the registry read so a reload racing this call
        // keeps its result out of the cache.
        let generation = self.cache.generation(namespace);
        let Some(entry) = self.lookup(language, namespace, key) else {
            return self.missing(namespace, key);
        };

        let template_key = CacheKey::new(&entry.language, namespace, key);
        let rendered = self
            .template(template_key, &entry.text, generation)
            .render(placeholders);
        if placeholders.is_empty() {
            self.cache
                .put_resolved_at(l1_key, Arc::from(rendered.as_str()), generation);
        }
        rendered
    }

    /// Resolves a key without placeholders.
    #[must_use]
    pub fn resolve_plain(&self, language: &str, namespace: &str, key: &str) -> String {
        self.resolve(language, namespace, key, &Placeholders::new())
    }

    /// Resolves a count-aware key.
    ///
    /// The plural category is chosen by the language of the entry actually
    /// found, and `{count}` is supplied unless the caller already did.
    #[must_use]
    pub fn resolve_count(
        &self,
        language: &str,
        namespace: &str,
        key: &str,
        count: u64,
        placeholders: &Placeholders,
    ) -> String {
        let generation = self.cache.generation(namespace);
        let Some(entry) = self.lookup(language, namespace, key) else {
            return self.missing(namespace, key);
        };

        let mut args = placeholders.clone();
        if args.get("count").is_none() {
            args.insert("count", count);
        }

        match &entry.plural_forms {
            Some(forms) => {
                let wanted = if count == 0 && forms.contains(PluralCategory::Zero) {
                    PluralCategory::Zero
                } else {
                    category_for(&entry.language, count)
                };
                let (form, text) = forms.select(wanted);
                let template_key = CacheKey::with_form(&entry.language, namespace, key, form);
                self.template(template_key, text, generation).render(&args)
            }
            None => {
                let template_key = CacheKey::new(&entry.language, namespace, key);
                self.template(template_key, &entry.text, generation)
                    .render(&args)
            }
        }
    }

    /// Returns true if the key resolves through the fallback chain.
    #[must_use]
    pub fn exists(&self, language: &str, namespace: &str, key: &str) -> bool {
        self.lookup(language, namespace, key).is_some()
    }

    /// Looks up the entry the fallback chain would use.
    #[must_use]
    pub fn lookup(&self, language: &str, namespace: &str, key: &str) -> Option<Arc<Translation>> {
        let snapshot = self.registry.snapshot();
        if let Some(entry) = snapshot.get(language, namespace, key) {
            return Some(Arc::clone(entry));
        }
        if language != self.config.default_language {
            return snapshot
                .get(&self.config.default_language, namespace, key)
                .cloned();
        }
        None
    }

    /// Compiled template for `text`. A cached template compiled from other
    /// text is never used.
    fn template(&self, key: CacheKey, text: &str, generation: Generation) -> Arc<Template> {
        if let Some(template) = self.cache.template(&key) {
            if template.source() == text {
                return template;
            }
        }
        let template = Arc::new(Template::compile(text));
        self.cache
            .put_template_at(key, Arc::clone(&template), generation);
        template
    }

    fn missing(&self, namespace: &str, key: &str) -> String {
        if self.missing.record(namespace, key) {
            warn!(
                target: "lingua::missing",
                "Missing translation {} (no entry in requested or default language {})",
                full_key(namespace, key),
                self.config.default_language
            );
        }
        self.config.missing_key.render(namespace, key)
    }
}
