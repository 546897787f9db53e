//! Rate limiting, retry, and cache-backed snapshot storage.
//!
//! These three components sit between the Upstream Adapters and the
//! Scheduler: the [`RateLimiter`] gates outbound calls, [`retry`] wraps a
//! single adapter call with exponential backoff, and [`SnapshotStore`]
//! persists the merged [`tokenwatch_types::Snapshot`] the Scheduler produces
//! each tick.

mod cache;
mod rate_limiter;
mod retry;

pub use crate::cache::{CacheBackend, MokaBackend, SnapshotStore};
pub use crate::rate_limiter::RateLimiter;
pub use crate::retry::retry;
