//! Node configuration, loaded from one TOML file.

use lingua_registry::{CacheConfig, ResolverConfig};
use lingua_remote::RemoteConfig;
use lingua_store::FileStoreConfig;
use lingua_sync::SyncConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or checking the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address of the admin API.
    pub bind: String,
    /// Fixed server id; a fresh one is generated when unset.
    pub server_id: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8420".to_string(),
            server_id: None,
        }
    }
}

/// Everything a node needs to run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub server: ServerConfig,
    pub store: FileStoreConfig,
    pub resolver: ResolverConfig,
    pub cache: CacheConfig,
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    /// JSON file for remote content hashes; `None` keeps them in memory.
    pub ledger_path: Option<PathBuf>,
    /// Period of the background full sync; `None` disables it.
    pub sync_interval_secs: Option<u64>,
}

impl NodeConfig {
    /// Reads and parses `path`. Does not validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Parsed listener address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("server.bind {:?}: {e}", self.server.bind)))
    }

    #[must_use]
    pub fn sync_interval(&self) -> Option<Duration> {
        self.sync_interval_secs.map(Duration::from_secs)
    }

    /// Checks every section and their agreement with each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if let Some(id) = &self.server.server_id {
            id.parse::<lingua_types::ServerId>()
                .map_err(|e| ConfigError::Invalid(format!("server.server_id: {e}")))?;
        }
        if !self
            .store
            .source_language
            .eq_ignore_ascii_case(&self.sync.source_language)
        {
            return Err(ConfigError::Invalid(format!(
                "store.source_language ({}) and sync.source_language ({}) differ",
                self.store.source_language, self.sync.source_language
            )));
        }
        if self.sync_interval_secs == Some(0) {
            return Err(ConfigError::Invalid("sync_interval_secs must be positive".into()));
        }
        self.sync
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.remote
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }
}
