//! Global request rate limiter.
//!
//! A fixed number of permits replenished over an interval, shared by every
//! request the client makes regardless of which namespace issued it.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovLimiter};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;

/// Configuration for rate limiting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per interval (also the burst size).
    pub permits: u32,
    /// Replenishment interval in milliseconds.
    pub interval_ms: u64,
}

impl Default for RateLimitConfig {
    /// Default: 20 requests per second.
    fn default() -> Self {
        Self {
            permits: 20,
            interval_ms: 1_000,
        }
    }
}

/// Token bucket rate limiter.
pub struct RateLimiter {
    limiter: GovLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Creates a limiter from configuration.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        let permits = NonZeroU32::new(config.permits).unwrap_or(NonZeroU32::MIN);
        let interval = Duration::from_millis(config.interval_ms.max(1));
        let period = interval / permits.get();
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(permits))
            .allow_burst(permits);
        Self {
            limiter: GovLimiter::direct(quota),
            config,
        }
    }

    /// Waits for a permit. Cancel-safe.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Takes a permit without waiting. Returns false if none is available.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}
