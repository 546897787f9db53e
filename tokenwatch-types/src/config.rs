//! Configuration types for the aggregator pipeline, cache, and transport boundary.
//!
//! All defaults mirror the documented defaults in the external interface contract:
//! 10s update interval, 30s cache TTL, 50-record adapter batch cap, 1000-token snapshot cap.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-upstream token-bucket admission parameters.
///
/// `points` permits are refilled linearly over `duration`. See
/// [`tokenwatch_middleware::RateLimiter`] for the admission algorithm.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Permits available per window.
    pub points: u32,
    /// Refill window.
    pub duration: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            points: 300,
            duration: Duration::from_secs(60),
        }
    }
}

/// Exponential-backoff-with-jitter parameters for the Retry wrapper.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Base delay used in `base_delay * 2^(k-2)` before attempt `k`.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Configuration for a single Upstream Adapter.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Stable tag identifying this upstream in `sources`, logs, and rate-limiter keys.
    pub tag: String,
    /// Base URL the adapter issues its GET against.
    pub base_url: String,
    /// Admission policy for this upstream.
    pub rate_limiter: RateLimiterConfig,
    /// Retry policy for this upstream's fetch call.
    pub retry: RetryConfig,
}

/// Cache connection and TTL configuration for the Snapshot Store.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Connection string for the external key-value cache.
    pub cache_url: String,
    /// TTL applied to `tokens:all` and `token:<address>` entries.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_url: "redis://127.0.0.1:6379".to_string(),
            ttl: Duration::from_secs(30),
        }
    }
}

/// Scheduler cadence and batch-size knobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Period between ticks.
    pub update_interval: Duration,
    /// Per-adapter cap on the number of records returned by `fetch`.
    pub batch_size: usize,
    /// Cap on the number of tokens kept in a published snapshot.
    pub max_tokens: usize,
    /// Number of per-token cache keys written alongside `tokens:all`.
    pub per_token_cache_cap: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(10),
            batch_size: 50,
            max_tokens: 1000,
            per_token_cache_cap: 100,
        }
    }
}

/// Top-level application configuration, assembled once at startup from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Snapshot Store / cache settings.
    pub cache: CacheConfig,
    /// Scheduler cadence and batch-size knobs.
    pub scheduler: SchedulerConfig,
    /// One entry per configured Upstream Adapter.
    pub upstreams: Vec<UpstreamConfig>,
    /// TCP port the (out-of-scope) transport layer listens on; carried here only
    /// because it shares the same environment-driven startup path.
    pub listen_port: u16,
}
