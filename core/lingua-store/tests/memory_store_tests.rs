use lingua_store::{ContentStore, DefaultFile, MemoryContentStore};
use lingua_types::{EntryOrigin, Translation};
use pretty_assertions::assert_eq;

fn seeded() -> MemoryContentStore {
    let store = MemoryContentStore::new("en_us");
    store
        .insert_document("en_us", "core", "main.yml", "greeting: Hello\n")
        .unwrap();
    store
        .insert_document("en_us", "core", "menu.yml", "title: Menu\n")
        .unwrap();
    store
        .insert_document("de_de", "core", "menu.yml", "title: Menü\n")
        .unwrap();
    store
}

#[tokio::test]
async fn behaves_like_the_file_tree() {
    let store = seeded();

    let mut keys: Vec<(String, String)> = store
        .load_all_entries("core")
        .await
        .unwrap()
        .into_iter()
        .map(|e| (e.language, e.key))
        .collect();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            ("de_de".to_string(), "menu.title".to_string()),
            ("en_us".to_string(), "greeting".to_string()),
            ("en_us".to_string(), "menu.title".to_string()),
        ]
    );
    assert_eq!(store.languages("core").await.unwrap(), vec!["de_de", "en_us"]);
    assert!(store.exists("core").await.unwrap());
    assert!(!store.exists("shop").await.unwrap());
}

#[tokio::test]
async fn write_file_strips_prefix() {
    let store = seeded();
    store
        .write_file(
            "fr_fr",
            "core",
            "menu.yml",
            &[Translation::new("core", "menu.title", "fr_fr", "Menu FR")],
        )
        .await
        .unwrap();

    let rendered = store.render_file("fr_fr", "core", "menu.yml").unwrap().unwrap();
    assert!(rendered.contains("title: Menu FR"));
    assert_eq!(
        store.get("fr_fr", "core", "menu.title").await.unwrap().unwrap().text,
        "Menu FR"
    );
}

#[tokio::test]
async fn dynamic_entries_and_delete() {
    let store = seeded();
    store
        .put_dynamic(&Translation::new("core", "greeting", "en_us", "Hi"))
        .await
        .unwrap();

    let greeting = store.get("en_us", "core", "greeting").await.unwrap().unwrap();
    assert_eq!(greeting.text, "Hi");
    assert_eq!(greeting.origin, EntryOrigin::Database);

    assert!(store.delete("en_us", "core", "greeting").await.unwrap());
    assert_eq!(
        store.get("en_us", "core", "greeting").await.unwrap().unwrap().text,
        "Hello"
    );
    assert!(store.delete("en_us", "core", "greeting").await.unwrap());
    assert!(store.get("en_us", "core", "greeting").await.unwrap().is_none());
    assert!(!store.delete("en_us", "core", "greeting").await.unwrap());
}

#[tokio::test]
async fn create_defaults_skips_existing_files() {
    let store = seeded();
    let defaults = vec![
        DefaultFile::new("main.yml", "greeting: Replaced\n").unwrap(),
        DefaultFile::new("gui/shop.yml", "title: Shop\n").unwrap(),
    ];

    assert_eq!(store.create_defaults("core", &defaults).await.unwrap(), 1);
    assert_eq!(store.files("en_us", "core"), vec!["gui/shop.yml", "main.yml", "menu.yml"]);
    assert_eq!(
        store.get("en_us", "core", "greeting").await.unwrap().unwrap().text,
        "Hello"
    );
    assert_eq!(
        store.get("en_us", "core", "gui.shop.title").await.unwrap().unwrap().text,
        "Shop"
    );
}
