use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use festwatch_core::util::fingerprint;
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::store::{RemoteStore, StoreKeys};

/// Fixed-window limiter keyed by source address. Counters live in the remote
/// store so every instance of the service shares them.
#[derive(Clone)]
pub struct RateLimiter {
    store: RemoteStore,
    keys: StoreKeys,
    window: Duration,
    max_requests: u32,
    metrics: Arc<RateLimitMetrics>,
}

/// Outcome of a check that did not reject the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    /// The counter could not be consulted; the request passes unmetered.
    Skipped,
}

#[derive(Default)]
struct RateLimitMetrics {
    allowed: AtomicU64,
    limited: AtomicU64,
    fail_open: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitMetricsSnapshot {
    pub allowed: u64,
    pub limited: u64,
    pub fail_open: u64,
}

impl RateLimiter {
    pub fn from_config(config: &AppConfig, store: RemoteStore) -> Self {
        Self::new(
            store,
            StoreKeys::new(config.namespace.clone()),
            config.rate_limit_window,
            config.rate_limit_max_requests,
        )
    }

    pub fn new(store: RemoteStore, keys: StoreKeys, window: Duration, max_requests: u32) -> Self {
        Self {
            store,
            keys,
            window,
            max_requests,
            metrics: Arc::new(RateLimitMetrics::default()),
        }
    }

    pub const fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub const fn window(&self) -> Duration {
        self.window
    }

    pub async fn check(&self, source: &str) -> Result<RateDecision, AppError> {
        if !self.store.is_configured() {
            self.metrics.fail_open.fetch_add(1, Ordering::Relaxed);
            return Ok(RateDecision::Skipped);
        }

        let key = self.keys.rate_limit(source);
        let count = match self.store.increment(&key).await {
            Ok(count) => count,
            Err(error) => {
                self.metrics.fail_open.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    source = fingerprint(source),
                    error = %error,
                    "Rate limit counter unavailable, allowing request"
                );
                return Ok(RateDecision::Skipped);
            }
        };

        // Later hits re-arm a counter whose first EXPIRE was lost.
        let armed = if count == 1 {
            self.store.expire(&key, self.window).await
        } else {
            self.store.expire_if_unset(&key, self.window).await
        };
        if let Err(error) = armed {
            tracing::warn!(
                source = fingerprint(source),
                error = %error,
                "Failed to set rate limit window expiry"
            );
        }

        let ceiling = i64::from(self.max_requests);
        if count > ceiling {
            self.metrics.limited.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                source = fingerprint(source),
                count,
                "Rate limit exceeded"
            );
            return Err(AppError::TooManyRequests {
                remaining: 0,
                retry_after_secs: self.window.as_secs(),
            });
        }

        self.metrics.allowed.fetch_add(1, Ordering::Relaxed);
        let remaining = u32::try_from(ceiling - count.max(0)).unwrap_or(0);
        Ok(RateDecision::Allowed { remaining })
    }

    pub fn metrics_snapshot(&self) -> RateLimitMetricsSnapshot {
        RateLimitMetricsSnapshot {
            allowed: self.metrics.allowed.load(Ordering::Relaxed),
            limited: self.metrics.limited.load(Ordering::Relaxed),
            fail_open: self.metrics.fail_open.load(Ordering::Relaxed),
        }
    }
}
