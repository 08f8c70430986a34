//! Shared test helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use lingua_remote::{
    BuildRequest, BuildStatus, RemoteClient, RemoteError, RemoteFile, RemoteResult, RemoteString,
};

/// A remote service that is never reachable.
pub struct OfflineRemote;

fn offline<T>() -> RemoteResult<T> {
    Err(RemoteError::Api {
        status: 503,
        message: "service offline".into(),
    })
}

#[async_trait]
impl RemoteClient for OfflineRemote {
    async fn get_or_create_directory_path(&self, _segments: &[String]) -> RemoteResult<u64> {
        offline()
    }
    async fn get_file_by_path(&self, _path: &str) -> RemoteResult<Option<RemoteFile>> {
        offline()
    }
    async fn upload_to_storage(&self, _name: &str, _bytes: Vec<u8>) -> RemoteResult<u64> {
        offline()
    }
    async fn add_file(&self, _directory_id: u64, _name: &str, _storage_id: u64) -> RemoteResult<RemoteFile> {
        offline()
    }
    async fn update_file(&self, _file_id: u64, _storage_id: u64) -> RemoteResult<RemoteFile> {
        offline()
    }
    async fn find_string(&self, _identifier: &str) -> RemoteResult<Option<RemoteString>> {
        offline()
    }
    async fn add_string(&self, _file_id: u64, _identifier: &str, _text: &str) -> RemoteResult<RemoteString> {
        offline()
    }
    async fn update_string(&self, _string_id: u64, _text: &str) -> RemoteResult<RemoteString> {
        offline()
    }
    async fn upload_translation_file(&self, _file_id: u64, _locale: &str, _storage_id: u64) -> RemoteResult<()> {
        offline()
    }
    async fn build_export(&self, _request: &BuildRequest) -> RemoteResult<u64> {
        offline()
    }
    async fn get_build_status(&self, _build_id: u64) -> RemoteResult<BuildStatus> {
        offline()
    }
    async fn build_download_url(&self, _build_id: u64) -> RemoteResult<String> {
        offline()
    }
    async fn download_build(&self, _url: &str) -> RemoteResult<Vec<u8>> {
        offline()
    }
}
