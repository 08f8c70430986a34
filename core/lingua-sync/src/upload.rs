//! Pushing local entries to the remote service.
//!
//! Source entries come from the registry, which mirrors the files on disk
//! including keys the dynamic table does not know yet. Entries are diffed
//! against the hash ledger, grouped by the file that owns them, and pushed
//! per file so one failing file does not stop the rest.

use crate::config::{SyncConfig, UploadStrategy};
use crate::error::SyncResult;
use crate::session::SyncSession;
use lingua_registry::Snapshot;
use lingua_remote::{LocaleMapper, RemoteClient, RemoteFile};
use lingua_store::{ContentStore, HashLedger, KeyPrefix, codec, layout};
use lingua_types::Translation;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Entries of one file, and which of them changed.
struct FileGroup {
    prefix: KeyPrefix,
    entries: Vec<Translation>,
    changed: Vec<Translation>,
}

/// Where a local file lives on the remote service.
struct RemoteLocation {
    directory: Vec<String>,
    name: String,
    path: String,
}

#[derive(Debug, Clone, Copy)]
struct Pushed {
    uploaded: usize,
    skipped: usize,
    /// The remote side now holds the group's content.
    current: bool,
}

impl Pushed {
    fn all(count: usize) -> Self {
        Self {
            uploaded: count,
            skipped: 0,
            current: true,
        }
    }
}

/// Borrowed view of everything an upload needs.
pub(crate) struct Uploader<'a> {
    pub client: &'a dyn RemoteClient,
    pub store: &'a dyn ContentStore,
    pub ledger: &'a HashLedger,
    pub mapper: &'a LocaleMapper,
    pub config: &'a SyncConfig,
}

impl Uploader<'_> {
    /// Pushes changed source entries, then translations if configured.
    pub async fn upload(
        &self,
        namespace: &str,
        snapshot: &Snapshot,
        session: &mut SyncSession,
    ) -> SyncResult<()> {
        let source = self.config.source_language.as_str();
        let prefixes = self.store.key_prefixes(source, namespace).await?;

        let entries = snapshot.entries(namespace, source);
        if entries.is_empty() {
            info!("No source entries to upload for namespace {}", namespace);
        } else {
            let (groups, unchanged) = self.group(&prefixes, &entries);
            session.counts.skipped += unchanged;
            for (file, group) in groups {
                let result = match self.config.upload_strategy {
                    UploadStrategy::Files => self.push_file(namespace, &file, &group).await,
                    UploadStrategy::Strings => self.push_strings(namespace, &file, &group).await,
                };
                self.settle(session, &file, &group, result);
            }
        }

        if self.config.upload_translations {
            for language in snapshot.languages_of(namespace) {
                if language.eq_ignore_ascii_case(source) {
                    continue;
                }
                let entries = snapshot.entries(namespace, &language);
                let (groups, unchanged) = self.group(&prefixes, &entries);
                session.counts.skipped += unchanged;
                for (file, group) in groups {
                    let result = self
                        .push_translation(namespace, &language, &file, &group)
                        .await;
                    self.settle(session, &file, &group, result);
                }
            }
        }
        Ok(())
    }

    /// Groups entries by owning file, dropping files without changes.
    /// Also returns the number of unchanged entries.
    fn group(
        &self,
        prefixes: &[KeyPrefix],
        entries: &[Arc<Translation>],
    ) -> (BTreeMap<String, FileGroup>, usize) {
        let changed: HashSet<&str> = if self.config.hash_tracking {
            self.ledger
                .changed(entries)
                .into_iter()
                .map(|entry| entry.key.as_str())
                .collect()
        } else {
            entries.iter().map(|entry| entry.key.as_str()).collect()
        };

        let mut groups: BTreeMap<String, FileGroup> = BTreeMap::new();
        for entry in entries {
            let prefix = layout::file_for_key(prefixes, &entry.key);
            let group = groups.entry(prefix.file.clone()).or_insert_with(|| FileGroup {
                prefix,
                entries: Vec::new(),
                changed: Vec::new(),
            });
            group.entries.push(Translation::clone(entry));
            if changed.contains(entry.key.as_str()) {
                group.changed.push(Translation::clone(entry));
            }
        }
        groups.retain(|file, group| {
            if group.changed.is_empty() {
                debug!("No changes in {}", file);
            }
            !group.changed.is_empty()
        });
        (groups, entries.len() - changed.len())
    }

    fn settle(
        &self,
        session: &mut SyncSession,
        file: &str,
        group: &FileGroup,
        result: SyncResult<Pushed>,
    ) {
        match result {
            Ok(pushed) => {
                session.counts.uploaded += pushed.uploaded;
                session.counts.skipped += pushed.skipped;
                if pushed.current && self.config.hash_tracking {
                    self.ledger.record_all(group.changed.iter());
                }
            }
            Err(err) => {
                warn!("Upload of {} failed: {}", file, err);
                session.record_error(format!("upload {file}: {err}"));
            }
        }
    }

    fn location(&self, namespace: &str, file: &str) -> RemoteLocation {
        let mut directory = self.config.remote_segments(namespace);
        let (dirs, name) = file.rsplit_once('/').unwrap_or(("", file));
        directory.extend(dirs.split('/').filter(|s| !s.is_empty()).map(str::to_string));
        let path = format!("/{}/{}", directory.join("/"), name);
        RemoteLocation {
            directory,
            name: name.to_string(),
            path,
        }
    }

    async fn push_file(&self, namespace: &str, file: &str, group: &FileGroup) -> SyncResult<Pushed> {
        self.upload_source_file(namespace, file, group).await?;
        Ok(Pushed::all(group.changed.len()))
    }

    async fn upload_source_file(
        &self,
        namespace: &str,
        file: &str,
        group: &FileGroup,
    ) -> SyncResult<RemoteFile> {
        let location = self.location(namespace, file);
        let contents = codec::render_entries(file, &group.prefix.prefix, &group.entries)?;
        let existing = self.client.get_file_by_path(&location.path).await?;
        let storage_id = self
            .client
            .upload_to_storage(&location.name, contents.into_bytes())
            .await?;
        let remote = match existing {
            Some(existing) => self.client.update_file(existing.id, storage_id).await?,
            None => {
                let directory_id = self
                    .client
                    .get_or_create_directory_path(&location.directory)
                    .await?;
                self.client
                    .add_file(directory_id, &location.name, storage_id)
                    .await?
            }
        };
        info!(
            "Uploaded {} ({} changed entries) as {}",
            file,
            group.changed.len(),
            location.path
        );
        Ok(remote)
    }

    async fn push_strings(
        &self,
        namespace: &str,
        file: &str,
        group: &FileGroup,
    ) -> SyncResult<Pushed> {
        let location = self.location(namespace, file);
        let Some(remote_file) = self.client.get_file_by_path(&location.path).await? else {
            debug!("{} is not on the remote service yet, uploading whole file", location.path);
            return self.push_file(namespace, file, group).await;
        };

        let mut pushed = Pushed {
            uploaded: 0,
            skipped: 0,
            current: true,
        };
        for entry in &group.changed {
            let identifier = group.prefix.local_key(&entry.key);
            match self.client.find_string(identifier).await? {
                Some(existing) if existing.file_id.is_none_or(|id| id == remote_file.id) => {
                    if existing.text == entry.text {
                        pushed.skipped += 1;
                    } else {
                        self.client.update_string(existing.id, &entry.text).await?;
                        pushed.uploaded += 1;
                    }
                }
                _ => {
                    self.client
                        .add_string(remote_file.id, identifier, &entry.text)
                        .await?;
                    pushed.uploaded += 1;
                }
            }
        }
        debug!(
            "Pushed {} strings of {} ({} already current)",
            pushed.uploaded, file, pushed.skipped
        );
        Ok(pushed)
    }

    async fn push_translation(
        &self,
        namespace: &str,
        language: &str,
        file: &str,
        group: &FileGroup,
    ) -> SyncResult<Pushed> {
        let location = self.location(namespace, file);
        let Some(remote_file) = self.client.get_file_by_path(&location.path).await? else {
            debug!(
                "Skipping {} translations of {}: no remote source file",
                language, location.path
            );
            return Ok(Pushed {
                uploaded: 0,
                skipped: group.changed.len(),
                current: false,
            });
        };
        let contents = codec::render_entries(file, &group.prefix.prefix, &group.entries)?;
        let storage_id = self
            .client
            .upload_to_storage(&location.name, contents.into_bytes())
            .await?;
        let locale = self.mapper.to_remote(language);
        self.client
            .upload_translation_file(remote_file.id, &locale, storage_id)
            .await?;
        info!(
            "Uploaded {} translations of {} ({})",
            language, location.path, locale
        );
        Ok(Pushed::all(group.changed.len()))
    }
}
