use lingua_store::{BackupWriter, HashLedger};
use lingua_types::Translation;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;

fn entry(key: &str, text: &str) -> Arc<Translation> {
    Arc::new(Translation::new("core", key, "en_us", text))
}

// ── HashLedger ──────────────────────────────────────────────────

#[test]
fn unrecorded_entries_are_changed() {
    let ledger = HashLedger::in_memory();
    let entries = vec![entry("a", "A"), entry("b", "B")];
    assert_eq!(ledger.changed(&entries).len(), 2);
}

#[test]
fn recorded_entries_are_unchanged_until_edited() {
    let ledger = HashLedger::in_memory();
    let entries = vec![entry("a", "A"), entry("b", "B")];
    ledger.record_all(entries.iter().map(|e| e.as_ref()));
    assert!(ledger.changed(&entries).is_empty());

    let edited = vec![entry("a", "A2"), entry("b", "B")];
    let changed = ledger.changed(&edited);
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].key, "a");
    assert!(ledger.is_changed(&edited[0]));
    assert!(!ledger.is_changed(&edited[1]));
}

#[test]
fn forget_namespace_resets_diffing() {
    let ledger = HashLedger::in_memory();
    let entries = vec![entry("a", "A")];
    ledger.record_all(entries.iter().map(|e| e.as_ref()));
    assert_eq!(ledger.len(), 1);

    ledger.forget_namespace("core");
    assert!(ledger.is_empty());
    assert_eq!(ledger.changed(&entries).len(), 1);
}

#[tokio::test]
async fn ledger_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state/ledger.json");
    let entries = vec![entry("a", "A")];
    {
        let ledger = HashLedger::open(&path).await.unwrap();
        ledger.record_all(entries.iter().map(|e| e.as_ref()));
        ledger.flush().await.unwrap();
    }

    let ledger = HashLedger::open(&path).await.unwrap();
    assert_eq!(ledger.get("core", "en_us", "a"), Some(entries[0].hash()));
    assert!(ledger.changed(&entries).is_empty());
}

#[tokio::test]
async fn in_memory_flush_is_noop() {
    HashLedger::in_memory().flush().await.unwrap();
}

// ── BackupWriter ────────────────────────────────────────────────

#[tokio::test]
async fn backup_skips_empty_namespace() {
    let dir = TempDir::new().unwrap();
    let writer = BackupWriter::new(dir.path().join("backups"));
    assert!(writer.write("core", &[]).await.unwrap().is_none());
    assert!(!dir.path().join("backups").exists());
}

#[tokio::test]
async fn backup_is_timestamped_and_readable() {
    let dir = TempDir::new().unwrap();
    let writer = BackupWriter::new(dir.path());
    let entries = vec![entry("a", "A"), entry("b", "B")];

    let first = writer.write("core", &entries).await.unwrap().unwrap();
    let second = writer.write("core", &entries).await.unwrap().unwrap();
    assert_ne!(first, second);

    let name = first.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("core-"));
    assert!(name.ends_with(".json"));
    // core-YYYYmmddTHHMMSS.json
    assert_eq!(name.len(), "core-".len() + 15 + ".json".len());
    assert_eq!(&name[13..14], "T");

    let restored = BackupWriter::read(&first).await.unwrap();
    assert_eq!(restored.len(), 2);
    assert_eq!(restored[0].key, "a");
}
