//! Retry with exponential backoff.
//!
//! Only retryable failures (429, 5xx, connect and timeout errors) are
//! repeated. A server-supplied `Retry-After` replaces the computed delay.

use crate::error::RemoteResult;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Configuration for request retry behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Ceiling for the backoff, in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier applied after every retry.
    pub factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// No retries at all.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Fast retry for tests (minimal delays).
    #[must_use]
    pub fn testing() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1,
            max_delay_ms: 10,
            factor: 2.0,
        }
    }

    /// Delay before retry number `retry` (1-indexed).
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let initial = Duration::from_millis(self.initial_delay_ms);
        let max = Duration::from_millis(self.max_delay_ms);
        if retry <= 1 {
            return initial.min(max);
        }
        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let millis = self.initial_delay_ms as f64 * self.factor.max(1.0).powi(exponent);
        if !millis.is_finite() || millis >= self.max_delay_ms as f64 {
            return max;
        }
        Duration::from_millis(millis.round() as u64)
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts.
pub async fn retry<F, Fut, T>(
    operation_name: &str,
    config: &RetryConfig,
    mut operation: F,
) -> RemoteResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RemoteResult<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(
                        "Operation '{}' succeeded after {} retries",
                        operation_name,
                        attempt - 1
                    );
                }
                return Ok(value);
            }
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let delay = err
                    .retry_after()
                    .unwrap_or_else(|| config.delay_for_retry(attempt));
                warn!(
                    "Operation '{}' failed (attempt {}/{}): {}. Retrying in {:?}...",
                    operation_name, attempt, max_attempts, err, delay
                );
                sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
