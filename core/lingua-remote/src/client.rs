//! Remote service client abstraction.
//!
//! Mirrors the operations of a translation-management service that the
//! sync engine orchestrates: directory/file/string CRUD, raw storage
//! uploads, translation uploads, and export builds.

use crate::error::RemoteResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A directory on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDirectory {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub directory_id: Option<u64>,
}

/// A source file on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub directory_id: Option<u64>,
    /// Full `/`-separated path, leading slash included.
    #[serde(default)]
    pub path: String,
}

/// A source string on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteString {
    pub id: u64,
    pub identifier: String,
    pub text: String,
    #[serde(default)]
    pub file_id: Option<u64>,
}

/// State of an export build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildState {
    Created,
    InProgress,
    Finished,
    Failed,
    Canceled,
}

impl BuildState {
    /// Returns true once the build will not change any more.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, BuildState::Finished | BuildState::Failed | BuildState::Canceled)
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildState::Created => "created",
            BuildState::InProgress => "inProgress",
            BuildState::Finished => "finished",
            BuildState::Failed => "failed",
            BuildState::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// Progress of an export build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStatus {
    pub id: u64,
    pub status: BuildState,
    #[serde(default)]
    pub progress: u8,
}

/// Parameters of an export build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    /// Remote locale codes to export; empty exports every target language.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub target_language_ids: Vec<String>,
    pub skip_untranslated_strings: bool,
    pub export_approved_only: bool,
}

/// Operations of the translation-management service.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Resolves a directory path, creating missing segments. Idempotent;
    /// a concurrent creation of the same directory is not an error.
    async fn get_or_create_directory_path(&self, segments: &[String]) -> RemoteResult<u64>;

    /// Looks up a source file by its full path (`/a/b/file.yml`).
    async fn get_file_by_path(&self, path: &str) -> RemoteResult<Option<RemoteFile>>;

    /// Uploads raw bytes to temporary storage and returns the storage id.
    async fn upload_to_storage(&self, name: &str, bytes: Vec<u8>) -> RemoteResult<u64>;

    /// Creates a source file from a storage upload.
    async fn add_file(&self, directory_id: u64, name: &str, storage_id: u64)
    -> RemoteResult<RemoteFile>;

    /// Replaces a source file's content from a storage upload.
    async fn update_file(&self, file_id: u64, storage_id: u64) -> RemoteResult<RemoteFile>;

    /// Finds a source string by its identifier.
    async fn find_string(&self, identifier: &str) -> RemoteResult<Option<RemoteString>>;

    /// Creates a source string.
    async fn add_string(&self, file_id: u64, identifier: &str, text: &str)
    -> RemoteResult<RemoteString>;

    /// Replaces a source string's text.
    async fn update_string(&self, string_id: u64, text: &str) -> RemoteResult<RemoteString>;

    /// Uploads translations of a source file for one remote locale.
    async fn upload_translation_file(
        &self,
        file_id: u64,
        locale: &str,
        storage_id: u64,
    ) -> RemoteResult<()>;

    /// Requests an export build. Returns the build id.
    async fn build_export(&self, request: &BuildRequest) -> RemoteResult<u64>;

    /// Polls an export build.
    async fn get_build_status(&self, build_id: u64) -> RemoteResult<BuildStatus>;

    /// Returns the download URL of a finished build.
    async fn build_download_url(&self, build_id: u64) -> RemoteResult<String>;

    /// Downloads a finished build archive.
    async fn download_build(&self, url: &str) -> RemoteResult<Vec<u8>>;
}
