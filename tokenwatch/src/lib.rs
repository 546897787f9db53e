//! A real-time market-data aggregator for fungible-token listings.
//!
//! Overview
//! - Periodically pulls listing snapshots from independent upstreams (a DEX
//!   indexer and a market-data provider), each gated by a per-upstream
//!   [`RateLimiter`](tokenwatch_middleware::RateLimiter) and wrapped in
//!   [`retry`](tokenwatch_middleware::retry)'s exponential backoff.
//! - Normalizes and fuses overlapping records into a canonical `Token` by
//!   address, with DEX data preferred for real-time venue fields and
//!   market-data preferred for canonical market fields (`tokenwatch_core::merge`).
//! - Caches the canonical snapshot with a short TTL
//!   ([`SnapshotStore`](tokenwatch_middleware::SnapshotStore)) and serves it
//!   through a filtered/paginated [`read_api::ReadApi`].
//! - Diffs successive snapshots ([`change_detector`]) and fans out the
//!   resulting events to per-token and global subscribers ([`broadcaster`]).
//!
//! Deliberately out of scope: the HTTP/WebSocket transport layer, config
//! loading, structured logging configuration, and query/pagination wiring
//! beyond the [`read_api::ReadApi`] contract itself.
#![warn(missing_docs)]

/// Upstream Adapters: HTTP fetch plus provider DTO → canonical `Token` mapping.
pub mod adapters;
/// Routes change events to global and per-token subscriber sets.
pub mod broadcaster;
/// Diffs successive snapshots into typed change events.
pub mod change_detector;
/// Filter/sort/paginate facade over the Snapshot Store.
pub mod read_api;
/// The periodic tick: fetch, merge, snapshot, detect, broadcast.
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;

pub use adapters::{UpstreamAdapter, dex::DexAdapter, market::MarketAdapter};
pub use broadcaster::{Broadcaster, ConnectionId};
pub use change_detector::detect;
pub use read_api::{ListFilters, ListResponse, ReadApi, SortBy, SortOrder, TimePeriod};
pub use scheduler::Scheduler;

pub use tokenwatch_types::{
    AggError, AppConfig, CacheConfig, Direction, Event, EventPayload, RateLimiterConfig,
    RetryConfig, SchedulerConfig, Snapshot, Token, UpstreamConfig, UpstreamTag,
};
