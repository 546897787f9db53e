//! Cache-backed [`Snapshot`] storage.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tokenwatch_types::{AggError, CacheConfig, Snapshot, Token};
#[cfg(feature = "tracing")]
use tracing::warn;

const ALL_KEY: &str = "tokens:all";

fn token_key(address: &str) -> String {
    format!("token:{}", address.to_lowercase())
}

/// Abstraction over the external key-value cache the Snapshot Store writes
/// through. Lets tests exercise the cache-unavailable paths without a real
/// backend.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn set(&self, key: String, value: String) -> Result<(), AggError>;
    async fn get(&self, key: &str) -> Result<Option<String>, AggError>;
}

/// [`CacheBackend`] on top of an in-process [`moka::future::Cache`] with a
/// fixed time-to-live applied uniformly to every entry.
pub struct MokaBackend {
    cache: Cache<String, String>,
}

impl MokaBackend {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().time_to_live(ttl).build(),
        }
    }
}

#[async_trait]
impl CacheBackend for MokaBackend {
    async fn set(&self, key: String, value: String) -> Result<(), AggError> {
        self.cache.insert(key, value).await;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AggError> {
        Ok(self.cache.get(key).await)
    }
}

/// Cache-backed store for the current [`Snapshot`] and the first
/// `per_token_cache_cap` of its tokens, each under its own key.
///
/// Every entry carries the same TTL; there is no explicit invalidation. A
/// cache-unavailable error on `put` aborts the write (the Scheduler keeps
/// serving the previous snapshot); a cache-unavailable error on `get`/
/// `get_token` is treated as a miss.
pub struct SnapshotStore {
    backend: Arc<dyn CacheBackend>,
    per_token_cache_cap: usize,
}

impl SnapshotStore {
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>, per_token_cache_cap: usize) -> Self {
        Self {
            backend,
            per_token_cache_cap,
        }
    }

    /// Build the default Moka-backed store from [`CacheConfig`].
    #[must_use]
    pub fn with_moka(config: &CacheConfig, per_token_cache_cap: usize) -> Self {
        Self::new(Arc::new(MokaBackend::new(config.ttl)), per_token_cache_cap)
    }

    /// Write `tokens:all` plus a `token:<address>` entry for the first
    /// `per_token_cache_cap` tokens. Propagates the first write failure.
    pub async fn put(&self, snapshot: &Snapshot) -> Result<(), AggError> {
        let serialized = serde_json::to_string(snapshot)
            .map_err(|e| AggError::CacheUnavailable(e.to_string()))?;
        self.backend.set(ALL_KEY.to_string(), serialized).await?;

        for token in snapshot.tokens.iter().take(self.per_token_cache_cap) {
            let serialized = serde_json::to_string(token)
                .map_err(|e| AggError::CacheUnavailable(e.to_string()))?;
            self.backend
                .set(token_key(&token.address), serialized)
                .await?;
        }
        Ok(())
    }

    /// Fetch the current snapshot, if present and still within its TTL.
    pub async fn get(&self) -> Result<Option<Snapshot>, AggError> {
        match self.backend.get(ALL_KEY).await {
            Ok(Some(raw)) => Ok(serde_json::from_str(&raw).ok()),
            Ok(None) => Ok(None),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                warn!(error = %_err, "snapshot store unavailable, treating get() as miss");
                Ok(None)
            }
        }
    }

    /// Fetch a single token by address from the per-token cache only; does
    /// not fall back to the full snapshot (the Read API owns that).
    pub async fn get_token(&self, address: &str) -> Result<Option<Token>, AggError> {
        match self.backend.get(&token_key(address)).await {
            Ok(Some(raw)) => Ok(serde_json::from_str(&raw).ok()),
            Ok(None) => Ok(None),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                warn!(error = %_err, "snapshot store unavailable, treating get_token() as miss");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    struct FailingBackend;

    #[async_trait]
    impl CacheBackend for FailingBackend {
        async fn set(&self, _key: String, _value: String) -> Result<(), AggError> {
            Err(AggError::CacheUnavailable("down".to_string()))
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, AggError> {
            Err(AggError::CacheUnavailable("down".to_string()))
        }
    }

    struct InMemoryBackend {
        entries: Mutex<HashMap<String, String>>,
    }

    impl InMemoryBackend {
        fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl CacheBackend for InMemoryBackend {
        async fn set(&self, key: String, value: String) -> Result<(), AggError> {
            self.entries.lock().unwrap().insert(key, value);
            Ok(())
        }

        async fn get(&self, key: &str) -> Result<Option<String>, AggError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }
    }

    fn empty_snapshot() -> Snapshot {
        Snapshot::new(Vec::new(), Utc::now())
    }

    #[tokio::test]
    async fn put_propagates_cache_unavailable() {
        let store = SnapshotStore::new(Arc::new(FailingBackend), 100);
        assert!(matches!(
            store.put(&empty_snapshot()).await,
            Err(AggError::CacheUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn get_treats_backend_failure_as_a_miss() {
        let store = SnapshotStore::new(Arc::new(FailingBackend), 100);
        assert_eq!(store.get().await.unwrap(), None);
        assert_eq!(store.get_token("0xabc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn round_trips_through_an_in_memory_backend() {
        let store = SnapshotStore::new(Arc::new(InMemoryBackend::new()), 100);
        let snapshot = empty_snapshot();
        store.put(&snapshot).await.unwrap();
        let fetched = store.get().await.unwrap().unwrap();
        assert_eq!(fetched.tokens.len(), snapshot.tokens.len());
    }

    #[tokio::test]
    async fn per_token_cache_cap_limits_individual_token_entries() {
        let store = SnapshotStore::new(Arc::new(InMemoryBackend::new()), 1);
        let mut snapshot = empty_snapshot();
        let mut a = sample_token("0xaaa");
        let mut b = sample_token("0xbbb");
        a.volume_24h = rust_decimal::Decimal::from(2);
        b.volume_24h = rust_decimal::Decimal::from(1);
        snapshot.tokens = vec![a, b];
        store.put(&snapshot).await.unwrap();
        assert!(store.get_token("0xaaa").await.unwrap().is_some());
        assert!(store.get_token("0xbbb").await.unwrap().is_none());
    }

    fn sample_token(address: &str) -> Token {
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
            volume_24h: rust_decimal::Decimal::ZERO,
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
            sources: Default::default(),
            rank: None,
            image: None,
            last_updated: Utc::now(),
            is_merged: false,
        }
    }
}
