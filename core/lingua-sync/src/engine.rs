//! Sync engine: per-namespace bidirectional sync and write-through edits.
//!
//! A sync runs backup → upload → shared build → extract → merge →
//! materialize → reload. At most one sync per namespace runs at a time; a
//! second request is answered immediately with a failed session. Nothing
//! inside the pipeline escapes [`SyncEngine::sync`]: every error ends up in
//! the returned session.

use crate::broadcast::{PeerBroadcaster, PeerEventKind, PeerMessage, SYNC_TOPIC};
use crate::build::{BuildOptions, SharedBuildCache};
use crate::config::{SyncConfig, SyncDirection, validate_language, validate_namespace};
use crate::conflict::ConflictResolver;
use crate::download::extract_namespace_entries;
use crate::error::{SyncError, SyncResult};
use crate::materialize::materialize;
use crate::merge::merge;
use crate::session::{SyncSession, SyncStatus};
use crate::upload::Uploader;
use dashmap::{DashMap, DashSet};
use futures::future::join_all;
use lingua_registry::{HotCache, MissingKeyLog, Registry};
use lingua_remote::{LocaleMapper, RemoteClient};
use lingua_store::{BackupWriter, ContentStore, HashLedger};
use lingua_types::{EntryOrigin, ServerId, Translation};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Removes the namespace from the active set when dropped.
struct ActiveSync<'a> {
    active: &'a DashSet<String>,
    namespace: String,
}

impl Drop for ActiveSync<'_> {
    fn drop(&mut self) {
        self.active.remove(&self.namespace);
    }
}

/// Orchestrates sync between the content store, registry, caches and the
/// remote service.
pub struct SyncEngine {
    server_id: ServerId,
    config: SyncConfig,
    registry: Arc<Registry>,
    cache: Arc<HotCache>,
    missing: Arc<MissingKeyLog>,
    store: Arc<dyn ContentStore>,
    remote: Arc<dyn RemoteClient>,
    ledger: Arc<HashLedger>,
    mapper: LocaleMapper,
    builds: SharedBuildCache,
    conflicts: ConflictResolver,
    backups: Option<BackupWriter>,
    broadcaster: Option<Arc<dyn PeerBroadcaster>>,
    active: DashSet<String>,
    sessions: DashMap<String, SyncSession>,
}

impl SyncEngine {
    /// Creates an engine with an in-memory hash ledger, the default locale
    /// mapping and no broadcaster.
    pub fn new(
        config: SyncConfig,
        registry: Arc<Registry>,
        cache: Arc<HotCache>,
        store: Arc<dyn ContentStore>,
        remote: Arc<dyn RemoteClient>,
    ) -> Self {
        let mapper = LocaleMapper::default();
        let builds = SharedBuildCache::new(Arc::clone(&remote), build_options(&config, &mapper));
        Self {
            server_id: ServerId::new(),
            conflicts: ConflictResolver::new(config.conflict_policy),
            backups: config.backup_dir.clone().map(BackupWriter::new),
            registry,
            cache,
            missing: Arc::new(MissingKeyLog::new()),
            store,
            remote,
            ledger: Arc::new(HashLedger::in_memory()),
            mapper,
            builds,
            broadcaster: None,
            active: DashSet::new(),
            sessions: DashMap::new(),
            config,
        }
    }

    /// Uses a persistent hash ledger.
    #[must_use]
    pub fn with_ledger(mut self, ledger: Arc<HashLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    /// Uses an explicit locale mapping.
    #[must_use]
    pub fn with_mapper(mut self, mapper: LocaleMapper) -> Self {
        self.builds = SharedBuildCache::new(
            Arc::clone(&self.remote),
            build_options(&self.config, &mapper),
        );
        self.mapper = mapper;
        self
    }

    /// Shares the resolver's missing-key log, so reloads reset it.
    #[must_use]
    pub fn with_missing_log(mut self, missing: Arc<MissingKeyLog>) -> Self {
        self.missing = missing;
        self
    }

    /// Publishes peer messages through `broadcaster`.
    #[must_use]
    pub fn with_broadcaster(mut self, broadcaster: Arc<dyn PeerBroadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    #[must_use]
    pub fn with_server_id(mut self, server_id: ServerId) -> Self {
        self.server_id = server_id;
        self
    }

    pub fn server_id(&self) -> ServerId {
        self.server_id
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<HotCache> {
        &self.cache
    }

    pub fn builds(&self) -> &SharedBuildCache {
        &self.builds
    }

    // ── Sync ─────────────────────────────────────────────────────

    /// Syncs one namespace. Never fails: errors are reported in the session.
    pub async fn sync(&self, namespace: &str, direction: SyncDirection) -> SyncSession {
        if let Err(err) = validate_namespace(namespace) {
            return SyncSession::rejected(namespace, direction, err.to_string());
        }
        let Some(_active) = self.try_begin(namespace) else {
            warn!("Sync already in progress for namespace {}", namespace);
            let err = SyncError::AlreadyInProgress(namespace.to_string());
            return SyncSession::rejected(namespace, direction, err.to_string());
        };

        let mut session = SyncSession::start(namespace, direction);
        self.sessions.insert(namespace.to_string(), session.clone());
        info!("Starting {:?} sync of namespace {} (session {})", direction, namespace, session.id);

        match self.run(namespace, direction, &mut session).await {
            Ok(()) => session.finish(),
            Err(err) => {
                error!("Sync of namespace {} failed: {}", namespace, err);
                session.fail(err.to_string());
            }
        }

        match session.status {
            SyncStatus::Success => info!(
                "Sync of {} finished: {} uploaded, {} downloaded, {} skipped, {} conflicts",
                namespace,
                session.counts.uploaded,
                session.counts.downloaded,
                session.counts.skipped,
                session.counts.conflicts
            ),
            SyncStatus::Partial => warn!(
                "Sync of {} finished with {} errors",
                namespace,
                session.errors.len()
            ),
            _ => {}
        }
        self.sessions.insert(namespace.to_string(), session.clone());
        session
    }

    /// Syncs several namespaces concurrently. They share one export build.
    pub async fn sync_all(&self, namespaces: &[String], direction: SyncDirection) -> Vec<SyncSession> {
        join_all(namespaces.iter().map(|ns| self.sync(ns, direction))).await
    }

    /// The running or last finished session of `namespace`.
    pub fn session(&self, namespace: &str) -> Option<SyncSession> {
        self.sessions.get(namespace).map(|s| s.value().clone())
    }

    /// Latest session of every namespace synced so far.
    /// Latest session of every namespace, most recently started first.
    pub fn sessions(&self) -> Vec<SyncSession> {
        let mut sessions: Vec<SyncSession> = self.sessions.iter().map(|s| s.value().clone()).collect();
        sessions.sort_by(|a, b| b.id.cmp(&a.id));
        sessions
    }

    pub fn is_syncing(&self, namespace: &str) -> bool {
        self.active.contains(namespace)
    }

    fn try_begin(&self, namespace: &str) -> Option<ActiveSync<'_>> {
        self.active.insert(namespace.to_string()).then(|| ActiveSync {
            active: &self.active,
            namespace: namespace.to_string(),
        })
    }

    async fn run(
        &self,
        namespace: &str,
        direction: SyncDirection,
        session: &mut SyncSession,
    ) -> SyncResult<()> {
        if let Some(backups) = &self.backups {
            let snapshot = self.registry.snapshot();
            let entries: Vec<Arc<Translation>> = snapshot
                .languages_of(namespace)
                .iter()
                .flat_map(|lang| snapshot.entries(namespace, lang))
                .collect();
            if let Some(path) = backups.write(namespace, &entries).await? {
                debug!("Backed up namespace {} to {}", namespace, path.display());
            }
        }

        if direction.uploads() {
            let segments = self.config.remote_segments(namespace);
            let directory_id = self.remote.get_or_create_directory_path(&segments).await?;
            debug!("Namespace {} maps to remote directory {}", namespace, directory_id);

            let snapshot = self.registry.snapshot();
            let uploader = Uploader {
                client: self.remote.as_ref(),
                store: self.store.as_ref(),
                ledger: &self.ledger,
                mapper: &self.mapper,
                config: &self.config,
            };
            uploader.upload(namespace, &snapshot, session).await?;
        }

        if direction.downloads() {
            let archive = self.builds.get().await?;
            let remote = extract_namespace_entries(
                &archive.files,
                namespace,
                &self.config.remote_path(namespace),
                &self.config.source_language,
                &self.mapper,
            );
            for err in remote.errors {
                session.record_error(err);
            }

            let snapshot = self.registry.snapshot();
            let outcome = merge(
                remote.entries,
                &self.config.source_language,
                &self.conflicts,
                |language, key| snapshot.get(language, namespace, key).cloned(),
            );
            session.counts.skipped += outcome.unchanged;
            session.counts.conflicts += outcome.conflicts;
            debug!(
                "Merged namespace {}: {} new, {} unchanged, {} conflicts ({} kept local)",
                namespace, outcome.inserted, outcome.unchanged, outcome.conflicts, outcome.kept_local
            );

            if self.config.hash_tracking {
                self.ledger.record_all(outcome.accepted.iter());
            }
            let written = materialize(
                self.store.as_ref(),
                namespace,
                &self.config.source_language,
                outcome.accepted,
            )
            .await;
            session.counts.downloaded += written.entries_written;
            for err in written.errors {
                session.record_error(err);
            }
        }

        // Persist hashes first so a failed reload cannot lose them.
        if self.config.hash_tracking {
            self.ledger.flush().await?;
        }
        self.refresh_namespace(namespace).await?;
        self.publish(PeerMessage::sync_completed(self.server_id, namespace, session.counts))
            .await;
        Ok(())
    }

    // ── Reload ───────────────────────────────────────────────────

    /// Reloads `namespace` from the store and tells peers.
    pub async fn reload_namespace(&self, namespace: &str) -> SyncResult<usize> {
        validate_namespace(namespace)?;
        let count = self.refresh_namespace(namespace).await?;
        self.publish(PeerMessage::new(
            PeerEventKind::NamespaceReloaded,
            self.server_id,
            namespace,
        ))
        .await;
        Ok(count)
    }

    /// Store → registry swap → cache invalidation → missing-key reset.
    /// Does not publish.
    pub async fn refresh_namespace(&self, namespace: &str) -> SyncResult<usize> {
        validate_namespace(namespace)?;
        let entries = self.store.load_all_entries(namespace).await?;
        let count = entries.len();
        self.registry.reload_namespace(namespace, entries);
        let evicted = self.cache.invalidate_namespace(namespace);
        self.missing.forget_namespace(namespace);
        info!(
            "Reloaded namespace {} ({} entries, {} cached values dropped)",
            namespace, count, evicted
        );
        Ok(count)
    }

    /// Re-reads one entry from the store into the registry. Does not publish.
    pub async fn refresh_entry(&self, language: &str, namespace: &str, key: &str) -> SyncResult<bool> {
        validate_language(language)?;
        validate_namespace(namespace)?;
        if key.is_empty() {
            return Err(SyncError::Validation(format!("empty key in namespace {namespace}")));
        }
        let present = match self.store.get(language, namespace, key).await? {
            Some(entry) => {
                self.registry.put(entry);
                true
            }
            None => {
                self.registry.remove(language, namespace, key);
                false
            }
        };
        self.cache.invalidate_key(namespace, key);
        Ok(present)
    }

    // ── Dynamic entries ──────────────────────────────────────────

    /// Creates or replaces a runtime entry.
    pub async fn set_translation(&self, translation: Translation) -> SyncResult<()> {
        translation.validate()?;
        let translation = translation.with_origin(EntryOrigin::Database);
        self.store.put_dynamic(&translation).await?;

        let (namespace, language, key) = (
            translation.namespace.clone(),
            translation.language.clone(),
            translation.key.clone(),
        );
        self.registry.put(translation);
        self.cache.invalidate_key(&namespace, &key);
        info!("Set translation {}:{} [{}]", namespace, key, language);

        self.publish(PeerMessage::translation_changed(
            self.server_id,
            &namespace,
            &language,
            &key,
        ))
        .await;
        Ok(())
    }

    /// Removes an entry. A file entry hidden by a removed dynamic entry
    /// becomes visible again. Returns false if nothing was removed.
    pub async fn remove_translation(&self, language: &str, namespace: &str, key: &str) -> SyncResult<bool> {
        validate_namespace(namespace)?;
        if !self.store.delete(language, namespace, key).await? {
            return Ok(false);
        }
        self.refresh_entry(language, namespace, key).await?;
        info!("Removed translation {}:{} [{}]", namespace, key, language);

        self.publish(PeerMessage::translation_changed(
            self.server_id,
            namespace,
            language,
            key,
        ))
        .await;
        Ok(true)
    }

    async fn publish(&self, message: PeerMessage) {
        if !self.config.broadcast {
            return;
        }
        let Some(broadcaster) = &self.broadcaster else {
            return;
        };
        if let Err(err) = broadcaster.publish(SYNC_TOPIC, &message).await {
            warn!("Failed to publish {:?} for {}: {}", message.kind, message.namespace, err);
        }
    }
}

fn build_options(config: &SyncConfig, mapper: &LocaleMapper) -> BuildOptions {
    let targets = config
        .target_languages
        .iter()
        .map(|lang| mapper.to_remote(lang))
        .collect();
    BuildOptions {
        request: config.build_request(targets),
        ttl: config.build_ttl(),
        poll_interval: config.poll_interval(),
        timeout: config.build_timeout(),
    }
}
