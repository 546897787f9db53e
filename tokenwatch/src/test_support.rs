//! Shared test-only helpers used across this crate's unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokenwatch_middleware::CacheBackend;
use tokenwatch_types::AggError;

/// An always-available in-memory [`CacheBackend`], for tests that need a
/// [`tokenwatch_middleware::SnapshotStore`] without a real cache.
pub struct InMemoryCacheBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryCacheBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCacheBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn set(&self, key: String, value: String) -> Result<(), AggError> {
        self.entries.lock().expect("poisoned").insert(key, value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AggError> {
        Ok(self.entries.lock().expect("poisoned").get(key).cloned())
    }
}
