//! Remote client configuration.

use crate::error::{RemoteError, RemoteResult};
use crate::rate_limit::RateLimitConfig;
use crate::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Environment variable that overrides the configured API token.
pub const TOKEN_ENV: &str = "LINGUA_REMOTE_TOKEN";

/// An API token. Never printed by `Debug`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wraps a token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Reads the token from [`TOKEN_ENV`], if set and non-empty.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var(TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .map(Self)
    }

    /// The raw token, for the `Authorization` header only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if no token is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Credential(<unset>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}

/// Configuration for the HTTP remote client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the service API (e.g. `https://api.example.com/api/v2`).
    pub api_base_url: String,
    /// Remote project identifier.
    pub project_id: u64,
    /// API token.
    pub credential: Credential,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retry policy for transient failures.
    pub retry: RetryConfig,
    /// Global request rate limit.
    pub rate_limit: RateLimitConfig,
    /// Explicit `local → remote` locale codes.
    pub locales: BTreeMap<String, String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.crowdin.com/api/v2".to_string(),
            project_id: 0,
            credential: Credential::default(),
            timeout_secs: 60,
            retry: RetryConfig::default(),
            rate_limit: RateLimitConfig::default(),
            locales: BTreeMap::new(),
        }
    }
}

impl RemoteConfig {
    /// Replaces the credential with [`TOKEN_ENV`] when it is set.
    #[must_use]
    pub fn with_env_credential(mut self) -> Self {
        if let Some(credential) = Credential::from_env() {
            self.credential = credential;
        }
        self
    }

    /// Checks the configuration before any request is made.
    pub fn validate(&self) -> RemoteResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(RemoteError::Config("api_base_url is empty".into()));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(RemoteError::Config(format!(
                "api_base_url must be an http(s) URL: {}",
                self.api_base_url
            )));
        }
        if self.project_id == 0 {
            return Err(RemoteError::Config("project_id is not set".into()));
        }
        if self.credential.is_empty() {
            return Err(RemoteError::Config(format!(
                "no API token (set credential or {TOKEN_ENV})"
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(RemoteError::Config("retry.max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}
