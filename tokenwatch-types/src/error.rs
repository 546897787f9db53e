use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the tokenwatch aggregator.
///
/// Variants line up with the error taxonomy the Scheduler, Retry wrapper, and
/// Snapshot Store use to decide whether a failure is retryable, fatal for a
/// tick, or safe to swallow and log.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AggError {
    /// HTTP timeout, connection failure, or a response body that failed to parse.
    #[error("transport error calling {upstream}: {message}")]
    Transport {
        /// Upstream tag the call was made against.
        upstream: String,
        /// Human-readable failure description.
        message: String,
    },

    /// The upstream (or the local rate limiter) rejected the call for now.
    #[error("rate limited on {upstream}, retry after {retry_after_ms}ms")]
    RateLimited {
        /// Upstream tag that was rate limited.
        upstream: String,
        /// Milliseconds until the next permit is available.
        retry_after_ms: u64,
    },

    /// The external cache backing the Snapshot Store could not be reached.
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    /// A single record failed validation (missing address, non-positive price, ...).
    #[error("validation failed for {address}: {reason}")]
    ValidationError {
        /// Address of the offending record, if known.
        address: String,
        /// Reason the record was rejected.
        reason: String,
    },

    /// Configuration is missing or malformed. Fatal at startup; never retried.
    #[error("config error: {0}")]
    ConfigError(String),

    /// Some but not all upstreams failed during a tick; the snapshot was still produced.
    #[error("{failed}/{attempted} upstreams failed: {details:?}")]
    PartialFailure {
        /// Number of upstreams that produced a usable result.
        successful: usize,
        /// Number of upstreams that failed outright.
        failed: usize,
        /// Total upstreams attempted this tick (successful + failed).
        attempted: usize,
        /// One message per failed upstream.
        details: Vec<String>,
    },

    /// Every upstream failed in the same tick; the tick is aborted without replacing the snapshot.
    #[error("all upstreams failed: {0:?}")]
    AllUpstreamsFailed(Vec<String>),

    /// The caller (shutdown signal, dropped task) cancelled the operation. Never retried.
    #[error("cancelled")]
    Cancelled,
}

impl AggError {
    /// Build a [`Transport`](Self::Transport) error.
    pub fn transport(upstream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            upstream: upstream.into(),
            message: message.into(),
        }
    }

    /// Build a [`RateLimited`](Self::RateLimited) error from a concrete wait duration.
    #[must_use]
    pub fn rate_limited(upstream: impl Into<String>, retry_after: Duration) -> Self {
        Self::RateLimited {
            upstream: upstream.into(),
            retry_after_ms: u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Build a [`ValidationError`](Self::ValidationError) for a rejected record.
    pub fn validation(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ValidationError {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Whether the Retry wrapper should attempt this call again.
    ///
    /// `ConfigError` and `Cancelled` are never retried; everything else
    /// represents a transient upstream condition.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ConfigError(_) | Self::Cancelled)
    }
}
