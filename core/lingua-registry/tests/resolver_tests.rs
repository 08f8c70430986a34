use lingua_registry::{
    CacheConfig, CacheKey, HotCache, MissingKeyPolicy, Placeholders, Registry, Resolver,
    ResolverConfig,
};
use lingua_types::{PluralForms, Translation};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

struct Fixture {
    registry: Arc<Registry>,
    cache: Arc<HotCache>,
    resolver: Resolver,
}

fn fixture_with(config: ResolverConfig) -> Fixture {
    let registry = Arc::new(Registry::new());
    let cache = Arc::new(HotCache::new(&CacheConfig::default()));
    let resolver = Resolver::new(Arc::clone(&registry), Arc::clone(&cache), config);
    Fixture {
        registry,
        cache,
        resolver,
    }
}

fn fixture() -> Fixture {
    fixture_with(ResolverConfig::default())
}

fn items_forms(one: &str, other: &str) -> PluralForms {
    PluralForms::from_pairs([("one", one), ("other", other)]).unwrap()
}

// ── Fallback chain ──────────────────────────────────────────────

#[test]
fn resolves_requested_language() {
    let f = fixture();
    f.registry.put(Translation::new("core", "hello", "de_de", "Hallo"));
    f.registry.put(Translation::new("core", "hello", "en_us", "Hello"));

    assert_eq!(f.resolver.resolve_plain("de_de", "core", "hello"), "Hallo");
}

#[test]
fn falls_back_to_default_language() {
    let f = fixture();
    f.registry.put(Translation::new("core", "hello", "en_us", "Hello"));

    assert_eq!(f.resolver.resolve_plain("fr_fr", "core", "hello"), "Hello");
    assert!(f.resolver.exists("fr_fr", "core", "hello"));
    assert_eq!(f.resolver.lookup("fr_fr", "core", "hello").unwrap().language, "en_us");
}

#[test]
fn missing_key_returns_literal_full_key() {
    let f = fixture();
    assert_eq!(f.resolver.resolve_plain("de_de", "core", "nope"), "core:nope");
    assert!(!f.resolver.exists("de_de", "core", "nope"));
}

#[test]
fn missing_key_uses_configured_format() {
    let f = fixture_with(ResolverConfig {
        missing_key: MissingKeyPolicy::Template("[{namespace}] {key} ({fullkey})".into()),
        ..ResolverConfig::default()
    });
    assert_eq!(
        f.resolver.resolve_plain("en_us", "core", "menu.title"),
        "[core] menu.title (core:menu.title)"
    );
}

#[test]
fn missing_keys_are_recorded_once() {
    let f = fixture();
    for _ in 0..5 {
        f.resolver.resolve_plain("de_de", "core", "nope");
        f.resolver.resolve_plain("fr_fr", "core", "nope");
    }
    f.resolver.resolve_plain("de_de", "core", "other");

    assert_eq!(f.resolver.missing_log().len(), 2);

    f.resolver.missing_log().forget_namespace("core");
    assert!(f.resolver.missing_log().is_empty());
}

#[test]
fn shared_missing_log_is_used() {
    let registry = Arc::new(Registry::new());
    let cache = Arc::new(HotCache::default());
    let log = Arc::new(lingua_registry::MissingKeyLog::new());
    let resolver = Resolver::with_missing_log(
        registry,
        cache,
        ResolverConfig::default(),
        Arc::clone(&log),
    );

    resolver.resolve_plain("en_us", "core", "nope");
    assert!(!log.record("core", "nope"));
}

// ── Placeholders ────────────────────────────────────────────────

#[test]
fn substitutes_placeholders() {
    let f = fixture();
    f.registry.put(Translation::new("core", "greet", "en_us", "Hello {name}, you are {age}"));

    let args = Placeholders::new().with("name", "Ana").with("age", 31);
    assert_eq!(
        f.resolver.resolve("en_us", "core", "greet", &args),
        "Hello Ana, you are 31"
    );
}

#[test]
fn unknown_placeholders_stay_verbatim() {
    let f = fixture();
    f.registry.put(Translation::new("core", "greet", "en_us", "Hello {name} from {city}"));

    let args = Placeholders::new().with("name", "Ana");
    assert_eq!(
        f.resolver.resolve("en_us", "core", "greet", &args),
        "Hello Ana from {city}"
    );
}

#[test]
fn l1_is_populated_only_without_placeholders() {
    let f = fixture();
    f.registry.put(Translation::new("core", "greet", "en_us", "Hello {name}"));
    let l1 = CacheKey::new("en_us", "core", "greet");

    f.resolver
        .resolve("en_us", "core", "greet", &Placeholders::new().with("name", "Ana"));
    assert!(f.cache.resolved(&l1).is_none());

    f.resolver.resolve_plain("en_us", "core", "greet");
    assert_eq!(f.cache.resolved(&l1).as_deref(), Some("Hello {name}"));
}

#[test]
fn fallback_result_is_cached_under_requested_language() {
    let f = fixture();
    f.registry.put(Translation::new("core", "hello", "en_us", "Hello"));

    f.resolver.resolve_plain("fr_fr", "core", "hello");
    let cached = f.cache.resolved(&CacheKey::new("fr_fr", "core", "hello"));
    assert_eq!(cached.as_deref(), Some("Hello"));
}

#[test]
fn stale_l1_is_served_until_invalidated() {
    let f = fixture();
    f.registry.put(Translation::new("core", "hello", "en_us", "Hello"));
    assert_eq!(f.resolver.resolve_plain("en_us", "core", "hello"), "Hello");

    f.registry.put(Translation::new("core", "hello", "en_us", "Howdy"));
    assert_eq!(f.resolver.resolve_plain("en_us", "core", "hello"), "Hello");

    f.cache.invalidate_namespace("core");
    assert_eq!(f.resolver.resolve_plain("en_us", "core", "hello"), "Howdy");
}

#[test]
fn templates_are_compiled_once() {
    let f = fixture();
    f.registry.put(Translation::new("core", "greet", "en_us", "Hello {name}"));

    for name in ["a", "b", "c"] {
        f.resolver
            .resolve("en_us", "core", "greet", &Placeholders::new().with("name", name));
    }
    let stats = f.cache.template_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 2);
}

#[test]
fn stale_template_is_not_reused_for_new_text() {
    let f = fixture();
    f.registry.put(Translation::new("core", "greet", "en_us", "Hello {name}"));
    let ada = Placeholders::new().with("name", "Ada");
    assert_eq!(f.resolver.resolve("en_us", "core", "greet", &ada), "Hello Ada");

    // No invalidation: the template must still follow the registry text.
    f.registry.put(Translation::new("core", "greet", "en_us", "Hi {name}"));
    assert_eq!(f.resolver.resolve("en_us", "core", "greet", &ada), "Hi Ada");
}

#[test]
fn reload_racing_readers_never_leaves_stale_text() {
    let f = fixture();
    f.registry
        .reload_namespace("core", vec![Translation::new("core", "k", "en_us", "old")]);
    let resolver = Arc::new(f.resolver);
    let stop = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let resolver = Arc::clone(&resolver);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    let _ = resolver.resolve_plain("en_us", "core", "k");
                }
            })
        })
        .collect();

    let mut stale = 0;
    for i in 0..2_000 {
        let text = format!("new{i}");
        f.registry
            .reload_namespace("core", vec![Translation::new("core", "k", "en_us", &text)]);
        f.cache.invalidate_namespace("core");
        if resolver.resolve_plain("en_us", "core", "k") != text {
            stale += 1;
        }
    }
    stop.store(true, Ordering::Relaxed);
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(stale, 0);
    assert_eq!(resolver.resolve_plain("en_us", "core", "k"), "new1999");
}

// ── Plurals ─────────────────────────────────────────────────────

#[test]
fn count_selects_plural_form() {
    let f = fixture();
    f.registry.put(Translation::plural(
        "shop",
        "cart.items",
        "en_us",
        items_forms("{count} item", "{count} items"),
    ));

    let none = Placeholders::new();
    assert_eq!(f.resolver.resolve_count("en_us", "shop", "cart.items", 1, &none), "1 item");
    assert_eq!(f.resolver.resolve_count("en_us", "shop", "cart.items", 5, &none), "5 items");
    assert_eq!(f.resolver.resolve_count("en_us", "shop", "cart.items", 0, &none), "0 items");
}

#[test]
fn zero_form_wins_when_present() {
    let f = fixture();
    let forms = PluralForms::from_pairs([
        ("zero", "No items"),
        ("one", "{count} item"),
        ("other", "{count} items"),
    ])
    .unwrap();
    f.registry.put(Translation::plural("shop", "cart.items", "en_us", forms));

    assert_eq!(
        f.resolver
            .resolve_count("en_us", "shop", "cart.items", 0, &Placeholders::new()),
        "No items"
    );
}

#[test]
fn plural_rule_follows_language_of_found_entry() {
    let f = fixture();
    f.registry.put(Translation::plural(
        "shop",
        "cart.items",
        "en_us",
        items_forms("{count} item", "{count} items"),
    ));

    // Japanese has no singular, but the English entry is the one found.
    assert_eq!(
        f.resolver
            .resolve_count("ja_jp", "shop", "cart.items", 1, &Placeholders::new()),
        "1 item"
    );
}

#[test]
fn missing_form_falls_back_to_other() {
    let f = fixture();
    f.registry.put(Translation::plural(
        "shop",
        "cart.items",
        "ru_ru",
        items_forms("{count} товар", "{count} товаров"),
    ));

    assert_eq!(
        f.resolver
            .resolve_count("ru_ru", "shop", "cart.items", 3, &Placeholders::new()),
        "3 товаров"
    );
}

#[test]
fn caller_count_placeholder_is_kept() {
    let f = fixture();
    f.registry.put(Translation::plural(
        "shop",
        "cart.items",
        "en_us",
        items_forms("{count} item", "{count} items"),
    ));

    let args = Placeholders::new().with("count", "five");
    assert_eq!(
        f.resolver.resolve_count("en_us", "shop", "cart.items", 5, &args),
        "five items"
    );
}

#[test]
fn count_on_plain_entry_injects_count() {
    let f = fixture();
    f.registry.put(Translation::new("core", "total", "en_us", "Total: {count}"));

    assert_eq!(
        f.resolver
            .resolve_count("en_us", "core", "total", 7, &Placeholders::new()),
        "Total: 7"
    );
}

#[test]
fn count_on_missing_key_returns_missing_format() {
    let f = fixture();
    assert_eq!(
        f.resolver
            .resolve_count("en_us", "shop", "nope", 2, &Placeholders::new()),
        "shop:nope"
    );
}

// ── Configuration ───────────────────────────────────────────────

#[test]
fn config_deserializes_missing_key_policy() {
    let config: ResolverConfig = serde_json::from_str(
        r#"{"default_language":"de_de","missing_key":{"mode":"template","format":"?{key}"}}"#,
    )
    .unwrap();
    assert_eq!(config.default_language, "de_de");
    assert_eq!(config.missing_key, MissingKeyPolicy::Template("?{key}".into()));

    let config: ResolverConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config.default_language, "en_us");
    assert_eq!(config.missing_key, MissingKeyPolicy::Literal);
}
