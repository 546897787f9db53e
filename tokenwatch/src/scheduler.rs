//! Periodic tick: fan out to Upstream Adapters, merge, snapshot, diff, broadcast.

use std::sync::Arc;
use std::time::Duration;

use tokenwatch_core::{StreamHandle, merge, normalize};
use tokenwatch_middleware::{SnapshotStore, retry};
use tokenwatch_types::{AggError, RetryConfig, Snapshot, Token};
use tokio::sync::{Mutex, oneshot};
use tokio::time::MissedTickBehavior;

use crate::adapters::UpstreamAdapter;
use crate::broadcaster::Broadcaster;
use crate::change_detector;

const STARTUP_DELAY: Duration = Duration::from_secs(1);

/// Drives the periodic tick described in §4.6.
///
/// Owns no network or cache state itself; each tick fans out to the
/// supplied adapters, merges their results, and coordinates the Snapshot
/// Store, Change Detector, and Broadcaster. Ticks are single-flight: if a
/// tick is still running when the next one is due, the next one is skipped.
pub struct Scheduler {
    adapters: Vec<Arc<dyn UpstreamAdapter>>,
    retry_config: RetryConfig,
    store: Arc<SnapshotStore>,
    broadcaster: Arc<Broadcaster>,
    update_interval: Duration,
    max_tokens: usize,
    previous: Mutex<Option<Snapshot>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(
        adapters: Vec<Arc<dyn UpstreamAdapter>>,
        retry_config: RetryConfig,
        store: Arc<SnapshotStore>,
        broadcaster: Arc<Broadcaster>,
        update_interval: Duration,
        max_tokens: usize,
    ) -> Self {
        Self {
            adapters,
            retry_config,
            store,
            broadcaster,
            update_interval,
            max_tokens,
            previous: Mutex::new(None),
        }
    }

    /// Spawn the periodic loop. The returned [`StreamHandle`] gracefully stops
    /// the loop before its next tick (completing any tick already in flight)
    /// when [`stop`](StreamHandle::stop) is called or the handle is dropped.
    pub fn spawn(self: Arc<Self>) -> StreamHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(STARTUP_DELAY).await;
            let mut interval = tokio::time::interval(self.update_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        self.run_tick().await;
                    }
                }
            }
        });
        StreamHandle::new(handle, stop_tx)
    }

    /// Run exactly one tick: fetch, merge, snapshot, detect, broadcast.
    pub async fn run_tick(&self) {
        let results = self.fetch_all().await;

        let successful: Vec<Vec<Token>> = results.iter().filter_map(|r| r.as_ref().ok().cloned()).collect();
        let failed: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err().map(|e| e.to_string()))
            .collect();

        if successful.is_empty() {
            let _all_failed = AggError::AllUpstreamsFailed(failed);
            #[cfg(feature = "tracing")]
            tracing::error!(error = %_all_failed, "all upstreams failed this tick, snapshot not replaced");
            return;
        }

        if !failed.is_empty() {
            let _partial = AggError::PartialFailure {
                successful: successful.len(),
                failed: failed.len(),
                attempted: successful.len() + failed.len(),
                details: failed,
            };
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_partial, "tick produced a snapshot from a subset of upstreams");
        }

        let normalized: Vec<Vec<Token>> = successful.into_iter().map(normalize).collect();
        let tokens = merge(normalized, self.max_tokens);
        let snapshot = Snapshot::new(tokens, chrono::Utc::now());

        if let Err(_err) = self.store.put(&snapshot).await {
            #[cfg(feature = "tracing")]
            tracing::error!(error = %_err, "snapshot store put failed, tick aborted, previous snapshot remains authoritative");
            return;
        }

        let mut previous_guard = self.previous.lock().await;
        let events = change_detector::detect(previous_guard.as_ref(), &snapshot);
        self.broadcaster.broadcast(&events);
        *previous_guard = Some(snapshot);
    }

    async fn fetch_all(&self) -> Vec<Result<Vec<Token>, AggError>> {
        let futures = self.adapters.iter().map(|adapter| {
            let adapter = Arc::clone(adapter);
            let retry_config = self.retry_config;
            async move {
                retry(retry_config, move || {
                    let adapter = Arc::clone(&adapter);
                    async move { adapter.fetch_once().await }
                })
                .await
            }
        });
        futures::future::join_all(futures).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use tokenwatch_types::UpstreamTag;

    use super::*;
    use crate::test_support::InMemoryCacheBackend;

    struct StaticAdapter {
        tag: &'static str,
        token: Token,
    }

    #[async_trait]
    impl UpstreamAdapter for StaticAdapter {
        fn tag(&self) -> &str {
            self.tag
        }

        async fn fetch_once(&self) -> Result<Vec<Token>, AggError> {
            Ok(vec![self.token.clone()])
        }
    }

    struct AlwaysFailingAdapter {
        tag: &'static str,
    }

    #[async_trait]
    impl UpstreamAdapter for AlwaysFailingAdapter {
        fn tag(&self) -> &str {
            self.tag
        }

        async fn fetch_once(&self) -> Result<Vec<Token>, AggError> {
            Err(AggError::transport(self.tag, "down"))
        }
    }

    fn sample_token(address: &str, tag: &str) -> Token {
        Token {
            address: address.to_string(),
            name: "name".to_string(),
            ticker: "TKR".to_string(),
            price: rust_decimal::Decimal::ONE,
            change_1h: rust_decimal::Decimal::ZERO,
            change_6h: rust_decimal::Decimal::ZERO,
            change_24h: rust_decimal::Decimal::ZERO,
            change_pct_24h: rust_decimal::Decimal::ZERO,
            market_cap: rust_decimal::Decimal::ZERO,
            market_cap_change_24h: rust_decimal::Decimal::ZERO,
            market_cap_change_pct_24h: rust_decimal::Decimal::ZERO,
            volume_24h: rust_decimal::Decimal::from(100),
            high_24h: rust_decimal::Decimal::ZERO,
            low_24h: rust_decimal::Decimal::ZERO,
            circulating_supply: rust_decimal::Decimal::ZERO,
            total_supply: rust_decimal::Decimal::ZERO,
            liquidity: rust_decimal::Decimal::ZERO,
            transaction_count_24h: 0,
            dex: String::new(),
            dex_url: String::new(),
            ath: rust_decimal::Decimal::ZERO,
            ath_change_pct: rust_decimal::Decimal::ZERO,
            ath_date: None,
            atl: rust_decimal::Decimal::ZERO,
            atl_change_pct: rust_decimal::Decimal::ZERO,
            atl_date: None,
            roi: None,
            sources: BTreeSet::from([UpstreamTag::new(tag)]),
            rank: None,
            image: None,
            last_updated: Utc::now(),
            is_merged: false,
        }
    }

    fn scheduler_with(adapters: Vec<Arc<dyn UpstreamAdapter>>) -> Scheduler {
        Scheduler::new(
            adapters,
            RetryConfig {
                max_attempts: 1,
                base_delay: Duration::from_millis(1),
            },
            Arc::new(SnapshotStore::new(Arc::new(InMemoryCacheBackend::new()), 100)),
            Arc::new(Broadcaster::new()),
            Duration::from_secs(10),
            1000,
        )
    }

    #[tokio::test]
    async fn zero_successful_upstreams_aborts_the_tick() {
        let scheduler = scheduler_with(vec![Arc::new(AlwaysFailingAdapter { tag: "dex" })]);
        scheduler.run_tick().await;
        assert!(scheduler.store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn partial_failure_still_produces_a_snapshot() {
        let scheduler = scheduler_with(vec![
            Arc::new(StaticAdapter {
                tag: "dex",
                token: sample_token("0xabc", "dex"),
            }),
            Arc::new(AlwaysFailingAdapter { tag: "market" }),
        ]);
        scheduler.run_tick().await;
        let snapshot = scheduler.store.get().await.unwrap().unwrap();
        assert_eq!(snapshot.tokens.len(), 1);
    }

    #[tokio::test]
    async fn successful_tick_writes_snapshot_and_updates_previous() {
        let calls = AtomicUsize::new(0);
        let scheduler = scheduler_with(vec![Arc::new(StaticAdapter {
            tag: "dex",
            token: sample_token("0xabc", "dex"),
        })]);
        scheduler.run_tick().await;
        let _ = calls.fetch_add(1, Ordering::SeqCst);
        let snapshot = scheduler.store.get().await.unwrap();
        assert!(snapshot.is_some());
    }
}
