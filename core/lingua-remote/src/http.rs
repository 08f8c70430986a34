//! HTTP implementation of [`RemoteClient`].
//!
//! Every request passes through the global rate limiter and the retry
//! policy. Responses wrap their payload in a `{"data": ...}` envelope;
//! list responses wrap each item again.

use crate::client::{BuildRequest, BuildStatus, RemoteClient, RemoteDirectory, RemoteFile, RemoteString};
use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteResult};
use crate::rate_limit::RateLimiter;
use crate::retry::retry;
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// Header carrying the file name of a storage upload.
const FILE_NAME_HEADER: &str = "Crowdin-API-FileName";

/// Page size used for list lookups.
const LIST_LIMIT: &str = "500";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    data: Vec<Envelope<T>>,
}

#[derive(Debug, Deserialize)]
struct StorageRef {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct DownloadLink {
    url: String,
}

/// HTTP client for the translation-management service.
pub struct HttpRemoteClient {
    config: RemoteConfig,
    client: Client,
    limiter: RateLimiter,
    /// Directory ids by `/`-joined path.
    directories: DashMap<String, u64>,
}

impl HttpRemoteClient {
    /// Creates a client. Fails if the configuration is incomplete.
    pub fn new(config: RemoteConfig) -> RemoteResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        let limiter = RateLimiter::new(config.rate_limit.clone());
        info!(
            "Remote client ready for project {} at {}",
            config.project_id, config.api_base_url
        );
        Ok(Self {
            config,
            client,
            limiter,
            directories: DashMap::new(),
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Number of directory paths resolved so far.
    #[must_use]
    pub fn cached_directories(&self) -> usize {
        self.directories.len()
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url.trim_end_matches('/'), path)
    }

    fn project_url(&self, path: &str) -> String {
        self.api_url(&format!("/projects/{}{}", self.config.project_id, path))
    }

    /// Sends a request built by `build`, rate-limited and retried.
    async fn send<F>(&self, operation: &str, build: F) -> RemoteResult<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let build = &build;
        let this = self;
        retry(operation, &self.config.retry, move || async move {
            this.limiter.acquire().await;
            let response = build()
                .bearer_auth(this.config.credential.expose())
                .send()
                .await?;
            check_status(response).await
        })
        .await
    }

    async fn send_data<T, F>(&self, operation: &str, build: F) -> RemoteResult<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let response = self.send(operation, build).await?;
        let body = response.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&body)?;
        Ok(envelope.data)
    }

    async fn send_list<T, F>(&self, operation: &str, build: F) -> RemoteResult<Vec<T>>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let response = self.send(operation, build).await?;
        let body = response.bytes().await?;
        let list: ListEnvelope<T> = serde_json::from_slice(&body)?;
        Ok(list.data.into_iter().map(|item| item.data).collect())
    }

    async fn find_directory(&self, parent: Option<u64>, name: &str) -> RemoteResult<Option<u64>> {
        let url = self.project_url("/directories");
        let directories: Vec<RemoteDirectory> = self
            .send_list("list directories", || {
                let mut request = self
                    .client
                    .get(&url)
                    .query(&[("filter", name), ("limit", LIST_LIMIT)]);
                if let Some(parent) = parent {
                    request = request.query(&[("directoryId", parent)]);
                }
                request
            })
            .await?;
        Ok(directories
            .into_iter()
            .find(|d| d.name == name && d.directory_id == parent)
            .map(|d| d.id))
    }

    async fn create_directory(&self, parent: Option<u64>, name: &str) -> RemoteResult<u64> {
        let url = self.project_url("/directories");
        let body = serde_json::json!({ "name": name, "directoryId": parent });
        let created: RemoteDirectory = self
            .send_data("create directory", || self.client.post(&url).json(&body))
            .await?;
        Ok(created.id)
    }
}

/// Converts a non-2xx response into a typed error.
async fn check_status(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status.as_u16() == 429 {
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(1);
        return Err(RemoteError::RateLimited { retry_after_secs });
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Pulls a readable message out of an error body.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.chars().take(200).collect();
    };
    if let Some(message) = value.pointer("/error/message").and_then(|m| m.as_str()) {
        return message.to_string();
    }
    if let Some(message) = value
        .pointer("/errors/0/error/errors/0/message")
        .and_then(|m| m.as_str())
    {
        return message.to_string();
    }
    body.chars().take(200).collect()
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn get_or_create_directory_path(&self, segments: &[String]) -> RemoteResult<u64> {
        if segments.is_empty() {
            return Err(RemoteError::Config("empty remote directory path".into()));
        }
        let full = segments.join("/");
        if let Some(id) = self.directories.get(&full) {
            return Ok(*id);
        }

        let mut parent = None;
        for (i, segment) in segments.iter().enumerate() {
            let path = segments[..=i].join("/");
            if let Some(id) = self.directories.get(&path) {
                parent = Some(*id);
                continue;
            }
            let id = match self.find_directory(parent, segment).await? {
                Some(id) => id,
                None => match self.create_directory(parent, segment).await {
                    Ok(id) => {
                        info!("Created remote directory: {} (id: {})", path, id);
                        id
                    }
                    Err(err) if err.is_conflict() => {
                        debug!("Directory {} was created concurrently, re-resolving", path);
                        match self.find_directory(parent, segment).await? {
                            Some(id) => id,
                            None => return Err(err),
                        }
                    }
                    Err(err) => return Err(err),
                },
            };
            self.directories.insert(path, id);
            parent = Some(id);
        }
        parent.ok_or_else(|| RemoteError::Config("empty remote directory path".into()))
    }

    async fn get_file_by_path(&self, path: &str) -> RemoteResult<Option<RemoteFile>> {
        let wanted = format!("/{}", path.trim_start_matches('/'));
        let name = wanted.rsplit('/').next().unwrap_or_default().to_string();
        let url = self.project_url("/files");
        let files: Vec<RemoteFile> = self
            .send_list("list files", || {
                self.client
                    .get(&url)
                    .query(&[("filter", name.as_str()), ("limit", LIST_LIMIT)])
            })
            .await?;
        Ok(files.into_iter().find(|f| f.path == wanted))
    }

    async fn upload_to_storage(&self, name: &str, bytes: Vec<u8>) -> RemoteResult<u64> {
        let url = self.api_url("/storages");
        let size = bytes.len();
        let storage: StorageRef = self
            .send_data("upload to storage", || {
                self.client
                    .post(&url)
                    .header(FILE_NAME_HEADER, name)
                    .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                    .body(bytes.clone())
            })
            .await?;
        debug!("Uploaded {} bytes to storage: {} (id: {})", size, name, storage.id);
        Ok(storage.id)
    }

    async fn add_file(
        &self,
        directory_id: u64,
        name: &str,
        storage_id: u64,
    ) -> RemoteResult<RemoteFile> {
        let url = self.project_url("/files");
        let body = serde_json::json!({
            "storageId": storage_id,
            "name": name,
            "directoryId": directory_id,
        });
        let file: RemoteFile = self
            .send_data("add file", || self.client.post(&url).json(&body))
            .await?;
        info!("Uploaded file: {} (id: {})", name, file.id);
        Ok(file)
    }

    async fn update_file(&self, file_id: u64, storage_id: u64) -> RemoteResult<RemoteFile> {
        let url = self.project_url(&format!("/files/{file_id}"));
        let body = serde_json::json!({ "storageId": storage_id });
        let file: RemoteFile = self
            .send_data("update file", || self.client.put(&url).json(&body))
            .await?;
        info!("Updated file: {} (id: {})", file.name, file.id);
        Ok(file)
    }

    async fn find_string(&self, identifier: &str) -> RemoteResult<Option<RemoteString>> {
        let url = self.project_url("/strings");
        let strings: Vec<RemoteString> = self
            .send_list("list strings", || {
                self.client.get(&url).query(&[
                    ("filter", identifier),
                    ("scope", "identifier"),
                    ("limit", LIST_LIMIT),
                ])
            })
            .await?;
        Ok(strings.into_iter().find(|s| s.identifier == identifier))
    }

    async fn add_string(
        &self,
        file_id: u64,
        identifier: &str,
        text: &str,
    ) -> RemoteResult<RemoteString> {
        let url = self.project_url("/strings");
        let body = serde_json::json!({
            "text": text,
            "identifier": identifier,
            "fileId": file_id,
        });
        let string: RemoteString = self
            .send_data("add string", || self.client.post(&url).json(&body))
            .await?;
        debug!("Added string: {} (id: {})", identifier, string.id);
        Ok(string)
    }

    async fn update_string(&self, string_id: u64, text: &str) -> RemoteResult<RemoteString> {
        let url = self.project_url(&format!("/strings/{string_id}"));
        let body = serde_json::json!([{ "op": "replace", "path": "/text", "value": text }]);
        let string: RemoteString = self
            .send_data("update string", || self.client.patch(&url).json(&body))
            .await?;
        debug!("Updated string: {} (id: {})", string.identifier, string.id);
        Ok(string)
    }

    async fn upload_translation_file(
        &self,
        file_id: u64,
        locale: &str,
        storage_id: u64,
    ) -> RemoteResult<()> {
        let url = self.project_url(&format!("/translations/{locale}"));
        let body = serde_json::json!({ "storageId": storage_id, "fileId": file_id });
        self.send("upload translation", || self.client.post(&url).json(&body))
            .await?;
        info!("Uploaded translations for file {} ({})", file_id, locale);
        Ok(())
    }

    async fn build_export(&self, request: &BuildRequest) -> RemoteResult<u64> {
        let url = self.project_url("/translations/builds");
        let status: BuildStatus = self
            .send_data("build export", || self.client.post(&url).json(request))
            .await?;
        info!("Requested export build {}", status.id);
        Ok(status.id)
    }

    async fn get_build_status(&self, build_id: u64) -> RemoteResult<BuildStatus> {
        let url = self.project_url(&format!("/translations/builds/{build_id}"));
        self.send_data("build status", || self.client.get(&url))
            .await
    }

    async fn build_download_url(&self, build_id: u64) -> RemoteResult<String> {
        let url = self.project_url(&format!("/translations/builds/{build_id}/download"));
        let link: DownloadLink = self
            .send_data("build download link", || self.client.get(&url))
            .await?;
        Ok(link.url)
    }

    async fn download_build(&self, url: &str) -> RemoteResult<Vec<u8>> {
        let response = retry("download build", &self.config.retry, || async {
            self.limiter.acquire().await;
            let response = self.client.get(url).send().await?;
            check_status(response).await
        })
        .await?;
        let bytes = response.bytes().await?;
        debug!("Downloaded export archive ({} bytes)", bytes.len());
        Ok(bytes.to_vec())
    }
}
