use lingua_store::{ContentStore, DefaultFile, FileContentStore, FileStoreConfig, StoreError};
use lingua_types::{EntryOrigin, Translation};
use pretty_assertions::assert_eq;
use std::path::Path;
use tempfile::TempDir;

async fn open_store(dir: &TempDir) -> FileContentStore {
    FileContentStore::open(FileStoreConfig {
        root: dir.path().join("lang"),
        source_language: "en_us".into(),
        dynamic_path: Some(dir.path().join("dynamic.json")),
    })
    .await
    .unwrap()
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join("lang").join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn sorted_keys(entries: &[Translation], language: &str) -> Vec<String> {
    let mut keys: Vec<String> = entries
        .iter()
        .filter(|e| e.language == language)
        .map(|e| e.key.clone())
        .collect();
    keys.sort();
    keys
}

// ── Loading ─────────────────────────────────────────────────────

#[tokio::test]
async fn loads_every_language_with_path_prefixes() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "en_us/core/main.yml", "greeting: Hello\n");
    write(dir.path(), "en_us/core/menu.yml", "title: Menu\nbuttons:\n  close: Close\n");
    write(dir.path(), "en_us/core/gui/shop.yml", "title: Shop\n");
    write(dir.path(), "de_de/core/menu.yml", "title: Menü\n");
    write(dir.path(), "en_us/other/main.yml", "x: y\n");
    let store = open_store(&dir).await;

    let entries = store.load_all_entries("core").await.unwrap();
    assert_eq!(
        sorted_keys(&entries, "en_us"),
        vec!["greeting", "gui.shop.title", "menu.buttons.close", "menu.title"]
    );
    assert_eq!(sorted_keys(&entries, "de_de"), vec!["menu.title"]);
    assert!(entries.iter().all(|e| e.namespace == "core"));
    assert!(entries.iter().all(|e| e.origin == EntryOrigin::File));
}

#[tokio::test]
async fn unknown_namespace_loads_empty() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    assert!(store.load_all_entries("nothing").await.unwrap().is_empty());
    assert!(!store.exists("nothing").await.unwrap());
}

#[tokio::test]
async fn non_translation_files_are_ignored() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "en_us/core/main.yml", "a: A\n");
    write(dir.path(), "en_us/core/README.txt", "not yaml: [");
    let store = open_store(&dir).await;

    assert_eq!(store.load_all_entries("core").await.unwrap().len(), 1);
}

#[tokio::test]
async fn get_reads_owning_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "de_de/core/menu.yml", "title: Menü\n");
    let store = open_store(&dir).await;

    let entry = store.get("de_de", "core", "menu.title").await.unwrap().unwrap();
    assert_eq!(entry.text, "Menü");
    assert!(store.get("de_de", "core", "menu.nope").await.unwrap().is_none());
    assert!(store.get("fr_fr", "core", "menu.title").await.unwrap().is_none());
}

#[tokio::test]
async fn languages_and_prefixes() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "en_us/core/main.yml", "a: A\n");
    write(dir.path(), "en_us/core/gui/shop.yml", "a: A\n");
    write(dir.path(), "fr_fr/core/main.yml", "a: A\n");
    write(dir.path(), "de_de/other/main.yml", "a: A\n");
    let store = open_store(&dir).await;

    assert_eq!(store.languages("core").await.unwrap(), vec!["en_us", "fr_fr"]);
    let prefixes = store.key_prefixes("en_us", "core").await.unwrap();
    let files: Vec<(&str, &str)> = prefixes
        .iter()
        .map(|p| (p.file.as_str(), p.prefix.as_str()))
        .collect();
    assert_eq!(files, vec![("gui/shop.yml", "gui.shop."), ("main.yml", "")]);
}

// ── Writing ─────────────────────────────────────────────────────

#[tokio::test]
async fn write_file_creates_and_merges() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    store
        .write_file(
            "de_de",
            "core",
            "menu.yml",
            &[Translation::new("core", "menu.title", "de_de", "Menü")],
        )
        .await
        .unwrap();
    store
        .write(
            "menu.yml",
            &Translation::new("core", "menu.buttons.close", "de_de", "Schließen"),
        )
        .await
        .unwrap();

    let raw = std::fs::read_to_string(dir.path().join("lang/de_de/core/menu.yml")).unwrap();
    assert!(raw.starts_with("# Generated by lingua"));
    assert!(raw.contains("buttons:"));

    let entries = store.load_all_entries("core").await.unwrap();
    assert_eq!(
        sorted_keys(&entries, "de_de"),
        vec!["menu.buttons.close", "menu.title"]
    );
}

#[tokio::test]
async fn write_rejects_invalid_entries_before_io() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    let err = store
        .write("menu.yml", &Translation::new("core", "", "de_de", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let err = store
        .write_file(
            "de_de",
            "core",
            "menu.yml",
            &[Translation::new("core", "menu.title", "fr_fr", "x")],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Malformed { .. }));

    let err = store
        .write("../escape.yml", &Translation::new("core", "a", "de_de", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidPath(_)));

    assert!(!dir.path().join("lang/de_de").exists());
}

#[tokio::test]
async fn delete_removes_from_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "de_de/core/menu.yml", "title: Menü\nclose: Zu\n");
    let store = open_store(&dir).await;

    assert!(store.delete("de_de", "core", "menu.title").await.unwrap());
    assert!(!store.delete("de_de", "core", "menu.title").await.unwrap());

    let entries = store.load_all_entries("core").await.unwrap();
    assert_eq!(sorted_keys(&entries, "de_de"), vec!["menu.close"]);
}

// ── Dynamic entries ─────────────────────────────────────────────

#[tokio::test]
async fn dynamic_entries_override_and_persist() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "en_us/core/main.yml", "motd: From file\n");
    {
        let store = open_store(&dir).await;
        store
            .put_dynamic(&Translation::new("core", "motd", "en_us", "From API"))
            .await
            .unwrap();
        store
            .put_dynamic(&Translation::new("core", "custom.welcome", "de_de", "Willkommen"))
            .await
            .unwrap();
    }

    let store = open_store(&dir).await;
    assert_eq!(store.dynamic().len(), 2);

    let motd = store.get("en_us", "core", "motd").await.unwrap().unwrap();
    assert_eq!(motd.text, "From API");
    assert_eq!(motd.origin, EntryOrigin::Database);

    let entries = store.load_all_entries("core").await.unwrap();
    assert_eq!(entries.len(), 2);

    assert!(store.delete("en_us", "core", "motd").await.unwrap());
    let motd = store.get("en_us", "core", "motd").await.unwrap().unwrap();
    assert_eq!(motd.text, "From file");
}

// ── Defaults ────────────────────────────────────────────────────

#[tokio::test]
async fn create_defaults_writes_missing_files_only() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "en_us/core/main.yml", "greeting: Custom\n");
    let store = open_store(&dir).await;

    let defaults = vec![
        DefaultFile::new("main.yml", "greeting: Hello\n").unwrap(),
        DefaultFile::new("menu.yml", "title: Menu\n").unwrap(),
    ];
    assert_eq!(store.create_defaults("core", &defaults).await.unwrap(), 1);
    assert_eq!(store.create_defaults("core", &defaults).await.unwrap(), 0);
    assert!(store.exists("core").await.unwrap());

    let greeting = store.get("en_us", "core", "greeting").await.unwrap().unwrap();
    assert_eq!(greeting.text, "Custom");
    let title = store.get("en_us", "core", "menu.title").await.unwrap().unwrap();
    assert_eq!(title.text, "Menu");
}

#[tokio::test]
async fn default_files_are_read_from_a_directory() {
    let dir = TempDir::new().unwrap();
    let defaults_dir = dir.path().join("defaults");
    std::fs::create_dir_all(defaults_dir.join("gui")).unwrap();
    std::fs::write(defaults_dir.join("main.yml"), "a: A\n").unwrap();
    std::fs::write(defaults_dir.join("gui/shop.yml"), "b: B\n").unwrap();
    std::fs::write(defaults_dir.join("notes.md"), "ignored").unwrap();

    let files = DefaultFile::read_dir(&defaults_dir).await.unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.file.as_str()).collect();
    assert_eq!(names, vec!["gui/shop.yml", "main.yml"]);
}
