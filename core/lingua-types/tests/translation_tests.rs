use lingua_types::{EntryOrigin, PluralCategory, PluralForms, Translation, full_key};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

fn item_forms() -> PluralForms {
    PluralForms::from_pairs([("one", "1 item"), ("other", "{count} items")]).unwrap()
}

// ── Construction ──────────────────────────────────────────────────

#[test]
fn new_entry_defaults() {
    let t = Translation::new("core", "greeting", "en_us", "Hello");
    assert_eq!(t.namespace, "core");
    assert_eq!(t.key, "greeting");
    assert_eq!(t.language, "en_us");
    assert_eq!(t.text, "Hello");
    assert_eq!(t.origin, EntryOrigin::File);
    assert!(t.plural_forms.is_none());
    assert!(t.content_hash.is_none());
    assert!(!t.is_plural());
}

#[test]
fn plural_entry_text_mirrors_other() {
    let t = Translation::plural("shop", "items", "en_us", item_forms());
    assert_eq!(t.text, "{count} items");
    assert!(t.is_plural());
    assert!(t.validate().is_ok());
}

#[test]
fn with_origin_sets_tag() {
    let t = Translation::new("core", "k", "en_us", "v").with_origin(EntryOrigin::Database);
    assert_eq!(t.origin, EntryOrigin::Database);
}

#[test]
fn full_key_format() {
    let t = Translation::new("core", "menu.title", "en_us", "Menu");
    assert_eq!(t.full_key(), "core:menu.title");
    assert_eq!(full_key("a", "b"), "a:b");
}

// ── Hashing ───────────────────────────────────────────────────────

#[test]
fn hash_is_computed_when_absent() {
    let a = Translation::new("core", "k", "en_us", "Hello");
    let b = Translation::new("core", "k", "de_de", "Hello").with_hash();
    assert_eq!(a.hash(), b.hash());
    assert!(b.content_hash.is_some());
    assert!(a.same_content(&b));
}

#[test]
fn differing_text_differs_in_hash() {
    let a = Translation::new("core", "k", "en_us", "A");
    let b = Translation::new("core", "k", "en_us", "B");
    assert!(!a.same_content(&b));
}

#[test]
fn plural_forms_participate_in_hash() {
    let a = Translation::plural("shop", "items", "en_us", item_forms());
    let other = PluralForms::from_pairs([("one", "one item"), ("other", "{count} items")]).unwrap();
    let b = Translation::plural("shop", "items", "en_us", other);
    assert_eq!(a.text, b.text);
    assert!(!a.same_content(&b));
}

// ── Validation ────────────────────────────────────────────────────

#[test]
fn validate_rejects_empty_fields() {
    assert!(Translation::new("", "k", "en_us", "v").validate().is_err());
    assert!(Translation::new("core", "", "en_us", "v").validate().is_err());
    assert!(Translation::new("core", "k", "", "v").validate().is_err());
}

#[test]
fn validate_rejects_reserved_characters() {
    assert!(Translation::new("co:re", "k", "en_us", "v").validate().is_err());
    assert!(Translation::new("core", "k", "en/us", "v").validate().is_err());
}

#[test]
fn validate_rejects_relative_directory_names() {
    assert!(Translation::new("..", "k", "en_us", "v").validate().is_err());
    assert!(Translation::new("core", "k", ".", "v").validate().is_err());
}

#[test]
fn validate_rejects_malformed_dotted_keys() {
    assert!(Translation::new("core", ".k", "en_us", "v").validate().is_err());
    assert!(Translation::new("core", "k.", "en_us", "v").validate().is_err());
    assert!(Translation::new("core", "a..b", "en_us", "v").validate().is_err());
    assert!(Translation::new("core", "a.b", "en_us", "v").validate().is_ok());
}

#[test]
fn validate_rejects_text_not_matching_other() {
    let mut t = Translation::plural("shop", "items", "en_us", item_forms());
    t.text = "something else".into();
    assert!(t.validate().is_err());
}

// ── Plural forms ──────────────────────────────────────────────────

#[test]
fn plural_forms_require_other() {
    assert!(PluralForms::from_pairs([("one", "1 item")]).is_err());
    let mut map = BTreeMap::new();
    map.insert(PluralCategory::One, "x".to_string());
    assert!(PluralForms::new(map).is_err());
}

#[test]
fn plural_forms_reject_unknown_category() {
    assert!(PluralForms::from_pairs([("other", "x"), ("several", "y")]).is_err());
}

#[test]
fn plural_forms_select_falls_back_to_other() {
    let forms = item_forms();
    assert_eq!(forms.select(PluralCategory::One), (PluralCategory::One, "1 item"));
    assert_eq!(
        forms.select(PluralCategory::Few),
        (PluralCategory::Other, "{count} items")
    );
}

#[test]
fn plural_forms_serde_validates() {
    let json = serde_json::to_string(&item_forms()).unwrap();
    assert_eq!(json, r#"{"one":"1 item","other":"{count} items"}"#);
    let back: PluralForms = serde_json::from_str(&json).unwrap();
    assert_eq!(back, item_forms());
    assert!(serde_json::from_str::<PluralForms>(r#"{"one":"x"}"#).is_err());
}

#[test]
fn plural_category_names() {
    for category in PluralCategory::ALL {
        assert_eq!(category.as_str().parse::<PluralCategory>().unwrap(), category);
        assert!(PluralCategory::is_category(category.as_str()));
    }
    assert!(!PluralCategory::is_category("title"));
}

#[test]
fn translation_serde_roundtrip_keeps_origin() {
    let t = Translation::plural("shop", "items", "en_us", item_forms())
        .with_origin(EntryOrigin::Remote)
        .with_hash();
    let json = serde_json::to_string(&t).unwrap();
    assert!(json.contains("\"origin\":\"remote\""));
    let back: Translation = serde_json::from_str(&json).unwrap();
    assert_eq!(back, t);
}
