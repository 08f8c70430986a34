//! Shared test helpers: a scripted remote service and a seeded engine.

#![allow(dead_code)]

use async_trait::async_trait;
use lingua_registry::{HotCache, Registry};
use lingua_remote::{
    BuildRequest, BuildState, BuildStatus, RemoteClient, RemoteError, RemoteFile, RemoteResult,
    RemoteString,
};
use lingua_store::{
    ContentStore, DefaultFile, KeyPrefix, MemoryContentStore, StoreError, StoreResult,
};
use lingua_sync::{NamespaceConfig, SyncConfig, SyncEngine};
use lingua_types::Translation;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// Calls made against [`ScriptedRemote`], by operation.
#[derive(Debug, Default)]
pub struct Calls {
    pub directories: AtomicU32,
    pub storage_uploads: AtomicU32,
    pub add_file: AtomicU32,
    pub update_file: AtomicU32,
    pub add_string: AtomicU32,
    pub update_string: AtomicU32,
    pub build_export: AtomicU32,
    pub build_status: AtomicU32,
    pub downloads: AtomicU32,
}

impl Calls {
    pub fn get(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }
}

/// In-memory stand-in for the translation-management service.
#[derive(Default)]
pub struct ScriptedRemote {
    pub calls: Calls,
    /// Files served by every export build.
    pub archive: Mutex<BTreeMap<String, String>>,
    /// Status polls answered with `inProgress` before the final state.
    pub polls_before_finish: AtomicU32,
    /// State reported once polling is done; `None` means finished.
    pub final_state: Mutex<Option<BuildState>>,
    /// Remote file paths whose add/update fails.
    pub failing_paths: Mutex<HashSet<String>>,
    pub files: Mutex<BTreeMap<String, RemoteFile>>,
    pub storage: Mutex<HashMap<u64, (String, Vec<u8>)>>,
    pub strings: Mutex<BTreeMap<String, RemoteString>>,
    /// `(file id, remote locale)` of every translation upload.
    pub translation_uploads: Mutex<Vec<(u64, String)>>,
    pub build_requests: Mutex<Vec<BuildRequest>>,
    pub fail_build_export: AtomicBool,
    directories: Mutex<HashMap<u64, String>>,
    directory_ids: Mutex<HashMap<String, u64>>,
    polls: Mutex<HashMap<u64, u32>>,
    next_id: AtomicU64,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        let remote = Self::default();
        remote.next_id.store(100, Ordering::SeqCst);
        remote
    }

    pub fn with_archive(files: &[(&str, &str)]) -> Self {
        let remote = Self::new();
        remote.set_archive(files);
        remote
    }

    pub fn set_archive(&self, files: &[(&str, &str)]) {
        *self.archive.lock() = files
            .iter()
            .map(|(path, contents)| (path.to_string(), contents.to_string()))
            .collect();
    }

    pub fn file(&self, path: &str) -> Option<RemoteFile> {
        self.files.lock().get(path).cloned()
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.files.lock().keys().cloned().collect()
    }

    /// Contents last uploaded to storage under `name`.
    pub fn last_upload(&self, name: &str) -> Option<String> {
        let storage = self.storage.lock();
        storage
            .iter()
            .filter(|(_, (n, _))| n == name)
            .max_by_key(|(id, _)| **id)
            .map(|(_, (_, bytes))| String::from_utf8_lossy(bytes).into_owned())
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn check_path(&self, path: &str) -> RemoteResult<()> {
        if self.failing_paths.lock().contains(path) {
            return Err(RemoteError::Api {
                status: 400,
                message: format!("cannot store {path}"),
            });
        }
        Ok(())
    }

    fn zip(&self) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in self.archive.lock().iter() {
            writer
                .start_file(name.as_str(), zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}

#[async_trait]
impl RemoteClient for ScriptedRemote {
    async fn get_or_create_directory_path(&self, segments: &[String]) -> RemoteResult<u64> {
        self.calls.directories.fetch_add(1, Ordering::SeqCst);
        let path = format!("/{}", segments.join("/"));
        if let Some(id) = self.directory_ids.lock().get(&path) {
            return Ok(*id);
        }
        let id = self.next_id();
        self.directory_ids.lock().insert(path.clone(), id);
        self.directories.lock().insert(id, path);
        Ok(id)
    }

    async fn get_file_by_path(&self, path: &str) -> RemoteResult<Option<RemoteFile>> {
        Ok(self.file(path))
    }

    async fn upload_to_storage(&self, name: &str, bytes: Vec<u8>) -> RemoteResult<u64> {
        self.calls.storage_uploads.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id();
        self.storage.lock().insert(id, (name.to_string(), bytes));
        Ok(id)
    }

    async fn add_file(&self, directory_id: u64, name: &str, _storage_id: u64) -> RemoteResult<RemoteFile> {
        self.calls.add_file.fetch_add(1, Ordering::SeqCst);
        let directory = self
            .directories
            .lock()
            .get(&directory_id)
            .cloned()
            .unwrap_or_default();
        let path = format!("{directory}/{name}");
        self.check_path(&path)?;
        let file = RemoteFile {
            id: self.next_id(),
            name: name.to_string(),
            directory_id: Some(directory_id),
            path: path.clone(),
        };
        self.files.lock().insert(path, file.clone());
        Ok(file)
    }

    async fn update_file(&self, file_id: u64, _storage_id: u64) -> RemoteResult<RemoteFile> {
        self.calls.update_file.fetch_add(1, Ordering::SeqCst);
        let file = self
            .files
            .lock()
            .values()
            .find(|f| f.id == file_id)
            .cloned()
            .ok_or(RemoteError::Api {
                status: 404,
                message: "File Not Found".into(),
            })?;
        self.check_path(&file.path)?;
        Ok(file)
    }

    async fn find_string(&self, identifier: &str) -> RemoteResult<Option<RemoteString>> {
        Ok(self.strings.lock().get(identifier).cloned())
    }

    async fn add_string(&self, file_id: u64, identifier: &str, text: &str) -> RemoteResult<RemoteString> {
        self.calls.add_string.fetch_add(1, Ordering::SeqCst);
        let string = RemoteString {
            id: self.next_id(),
            identifier: identifier.to_string(),
            text: text.to_string(),
            file_id: Some(file_id),
        };
        self.strings.lock().insert(identifier.to_string(), string.clone());
        Ok(string)
    }

    async fn update_string(&self, string_id: u64, text: &str) -> RemoteResult<RemoteString> {
        self.calls.update_string.fetch_add(1, Ordering::SeqCst);
        let mut strings = self.strings.lock();
        let string = strings
            .values_mut()
            .find(|s| s.id == string_id)
            .ok_or(RemoteError::Api {
                status: 404,
                message: "String Not Found".into(),
            })?;
        string.text = text.to_string();
        Ok(string.clone())
    }

    async fn upload_translation_file(&self, file_id: u64, locale: &str, _storage_id: u64) -> RemoteResult<()> {
        self.translation_uploads
            .lock()
            .push((file_id, locale.to_string()));
        Ok(())
    }

    async fn build_export(&self, request: &BuildRequest) -> RemoteResult<u64> {
        self.calls.build_export.fetch_add(1, Ordering::SeqCst);
        if self.fail_build_export.load(Ordering::SeqCst) {
            return Err(RemoteError::Api {
                status: 400,
                message: "Build Already In Progress".into(),
            });
        }
        self.build_requests.lock().push(request.clone());
        Ok(self.next_id())
    }

    async fn get_build_status(&self, build_id: u64) -> RemoteResult<BuildStatus> {
        self.calls.build_status.fetch_add(1, Ordering::SeqCst);
        let polls = {
            let mut polls = self.polls.lock();
            let count = polls.entry(build_id).or_default();
            *count += 1;
            *count
        };
        let status = if polls <= self.polls_before_finish.load(Ordering::SeqCst) {
            BuildState::InProgress
        } else {
            self.final_state.lock().unwrap_or(BuildState::Finished)
        };
        Ok(BuildStatus {
            id: build_id,
            status,
            progress: if status == BuildState::Finished { 100 } else { 50 },
        })
    }

    async fn build_download_url(&self, build_id: u64) -> RemoteResult<String> {
        Ok(format!("mock://builds/{build_id}.zip"))
    }

    async fn download_build(&self, _url: &str) -> RemoteResult<Vec<u8>> {
        self.calls.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(self.zip())
    }
}

/// Engine plus handles on its collaborators.
pub struct Harness {
    pub engine: Arc<SyncEngine>,
    pub remote: Arc<ScriptedRemote>,
    pub store: Arc<MemoryContentStore>,
    pub registry: Arc<Registry>,
    pub cache: Arc<HotCache>,
}

/// Fast polling, namespaces `core` and `shop`.
pub fn test_config() -> SyncConfig {
    let mut namespaces = BTreeMap::new();
    namespaces.insert("core".to_string(), NamespaceConfig::default());
    namespaces.insert("shop".to_string(), NamespaceConfig::default());
    SyncConfig {
        namespaces,
        poll_interval_ms: 10,
        build_timeout_secs: 5,
        ..Default::default()
    }
}

/// Source files:
/// - `en_us/core/main.yml`: greeting, farewell
/// - `en_us/core/menu.yml`: menu.title
/// - `en_us/shop/main.yml`: buy
pub fn seeded_store() -> MemoryContentStore {
    let store = MemoryContentStore::new("en_us");
    store
        .insert_document("en_us", "core", "main.yml", "greeting: Hello\nfarewell: Bye\n")
        .unwrap();
    store
        .insert_document("en_us", "core", "menu.yml", "title: Menu\n")
        .unwrap();
    store
        .insert_document("en_us", "shop", "main.yml", "buy: Buy\n")
        .unwrap();
    store
}

pub async fn harness_with(config: SyncConfig, remote: ScriptedRemote, store: MemoryContentStore) -> Harness {
    let registry = Arc::new(Registry::new());
    let cache = Arc::new(HotCache::default());
    let store = Arc::new(store);
    let remote = Arc::new(remote);
    let engine = SyncEngine::new(
        config,
        Arc::clone(&registry),
        Arc::clone(&cache),
        store.clone(),
        remote.clone(),
    );
    engine.refresh_namespace("core").await.unwrap();
    engine.refresh_namespace("shop").await.unwrap();
    Harness {
        engine: Arc::new(engine),
        remote,
        store,
        registry,
        cache,
    }
}

pub async fn harness(remote: ScriptedRemote) -> Harness {
    harness_with(test_config(), remote, seeded_store()).await
}

// ── Store wrapper ───────────────────────────────────────────────

/// A [`MemoryContentStore`] whose namespace loads can be made to fail.
pub struct FlakyStore {
    pub inner: MemoryContentStore,
    pub fail_loads: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: MemoryContentStore) -> Self {
        Self {
            inner,
            fail_loads: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ContentStore for FlakyStore {
    async fn load_all_entries(&self, namespace: &str) -> StoreResult<Vec<Translation>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("disk unavailable")));
        }
        self.inner.load_all_entries(namespace).await
    }

    async fn get(
        &self,
        language: &str,
        namespace: &str,
        key: &str,
    ) -> StoreResult<Option<Translation>> {
        self.inner.get(language, namespace, key).await
    }

    async fn write_file(
        &self,
        language: &str,
        namespace: &str,
        file: &str,
        entries: &[Translation],
    ) -> StoreResult<()> {
        self.inner.write_file(language, namespace, file, entries).await
    }

    async fn put_dynamic(&self, translation: &Translation) -> StoreResult<()> {
        self.inner.put_dynamic(translation).await
    }

    async fn delete(&self, language: &str, namespace: &str, key: &str) -> StoreResult<bool> {
        self.inner.delete(language, namespace, key).await
    }

    async fn key_prefixes(&self, language: &str, namespace: &str) -> StoreResult<Vec<KeyPrefix>> {
        self.inner.key_prefixes(language, namespace).await
    }

    async fn languages(&self, namespace: &str) -> StoreResult<Vec<String>> {
        self.inner.languages(namespace).await
    }

    async fn exists(&self, namespace: &str) -> StoreResult<bool> {
        self.inner.exists(namespace).await
    }

    async fn create_defaults(&self, namespace: &str, files: &[DefaultFile]) -> StoreResult<usize> {
        self.inner.create_defaults(namespace, files).await
    }
}
