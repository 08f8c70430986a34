//! Sync configuration.

use crate::error::{SyncError, SyncResult};
use lingua_remote::BuildRequest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// How a differing remote value is settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Accept the remote text.
    #[default]
    RemoteWins,
    /// Keep the local text.
    LocalWins,
    /// Keep the local text and log both values for an operator.
    Manual,
}

/// How changed source entries reach the remote service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStrategy {
    /// Re-upload every file holding a changed entry.
    #[default]
    Files,
    /// Add or update individual strings.
    Strings,
}

/// Which halves of a sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    #[default]
    Full,
    UploadOnly,
    DownloadOnly,
}

impl SyncDirection {
    /// Returns true if source entries are pushed.
    #[must_use]
    pub fn uploads(self) -> bool {
        matches!(self, SyncDirection::Full | SyncDirection::UploadOnly)
    }

    /// Returns true if remote translations are pulled.
    #[must_use]
    pub fn downloads(self) -> bool {
        matches!(self, SyncDirection::Full | SyncDirection::DownloadOnly)
    }
}

/// Per-namespace settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceConfig {
    /// Remote directory path, `/`-separated. Defaults to the namespace name.
    pub remote_path: Option<String>,
}

/// Configuration for the sync engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Ground-truth language for uploads.
    pub source_language: String,
    /// Namespaces synced by `sync_all` and the periodic task.
    pub namespaces: BTreeMap<String, NamespaceConfig>,
    pub conflict_policy: ConflictPolicy,
    pub upload_strategy: UploadStrategy,
    /// Also push non-source languages.
    pub upload_translations: bool,
    /// Diff against recorded remote hashes. When off every entry is pushed.
    pub hash_tracking: bool,
    /// Directory for pre-sync snapshots; `None` disables backups.
    pub backup_dir: Option<PathBuf>,
    /// How long a finished export build is reused, in seconds.
    pub build_ttl_secs: u64,
    /// Delay between build status polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Ceiling for build polling, in seconds.
    pub build_timeout_secs: u64,
    /// Local codes to export; empty exports every language.
    pub target_languages: Vec<String>,
    pub skip_untranslated_strings: bool,
    pub export_approved_only: bool,
    /// Publish peer messages after syncs and edits.
    pub broadcast: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source_language: "en_us".to_string(),
            namespaces: BTreeMap::new(),
            conflict_policy: ConflictPolicy::default(),
            upload_strategy: UploadStrategy::default(),
            upload_translations: false,
            hash_tracking: true,
            backup_dir: None,
            build_ttl_secs: 30,
            poll_interval_ms: 2_000,
            build_timeout_secs: 300,
            target_languages: Vec::new(),
            skip_untranslated_strings: false,
            export_approved_only: false,
            broadcast: true,
        }
    }
}

impl SyncConfig {
    /// Remote directory path of `namespace`, without surrounding slashes.
    #[must_use]
    pub fn remote_path(&self, namespace: &str) -> String {
        self.namespaces
            .get(namespace)
            .and_then(|ns| ns.remote_path.as_deref())
            .map(|path| path.trim_matches('/').to_string())
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| namespace.to_string())
    }

    /// Remote directory segments of `namespace`.
    #[must_use]
    pub fn remote_segments(&self, namespace: &str) -> Vec<String> {
        self.remote_path(namespace)
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Configured namespace names.
    #[must_use]
    pub fn namespace_names(&self) -> Vec<String> {
        self.namespaces.keys().cloned().collect()
    }

    #[must_use]
    pub fn build_ttl(&self) -> Duration {
        Duration::from_secs(self.build_ttl_secs)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    #[must_use]
    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }

    /// Export request built from the flags, with locales already mapped.
    #[must_use]
    pub fn build_request(&self, target_language_ids: Vec<String>) -> BuildRequest {
        BuildRequest {
            target_language_ids,
            skip_untranslated_strings: self.skip_untranslated_strings,
            export_approved_only: self.export_approved_only,
        }
    }

    /// Checks the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.source_language.trim().is_empty() {
            return Err(SyncError::Validation("source_language is empty".into()));
        }
        for name in self.namespaces.keys() {
            validate_namespace(name)?;
        }
        for (name, ns) in &self.namespaces {
            if let Some(path) = &ns.remote_path
                && path.split('/').any(|s| s == "..")
            {
                return Err(SyncError::Validation(format!(
                    "remote_path of namespace {name} must not contain '..'"
                )));
            }
        }
        if self.build_timeout_secs == 0 {
            return Err(SyncError::Validation("build_timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

/// Rejects namespace names that cannot be a directory name.
pub fn validate_namespace(namespace: &str) -> SyncResult<()> {
    validate_path_segment("namespace name", namespace)
}

/// Rejects language codes that cannot be a directory name.
pub fn validate_language(language: &str) -> SyncResult<()> {
    validate_path_segment("language code", language)
}

fn validate_path_segment(what: &str, value: &str) -> SyncResult<()> {
    if value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', ':'])
        || value.chars().any(char::is_whitespace)
    {
        return Err(SyncError::Validation(format!("invalid {what}: {value:?}")));
    }
    Ok(())
}
