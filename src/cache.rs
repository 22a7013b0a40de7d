//! Named key/value caches shared across the services.
//!
//! The store is injected into [`crate::state::SharedState`] as
//! `Arc<dyn CacheStore>` and flushed hourly by the scheduler. Entries never
//! expire on their own.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub const FOOD_SEARCH_CACHE: &str = "foodSearchCache";
pub const FOOD_CACHE: &str = "foodCache";
pub const REPORT_CACHE: &str = "reportCache";

/// Every cache the application knows about.
pub const ALL_CACHES: &[&str] = &[FOOD_SEARCH_CACHE, FOOD_CACHE, REPORT_CACHE];

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, cache: &str, key: &str) -> Option<Value>;

    async fn put(&self, cache: &str, key: &str, value: Value);

    async fn evict(&self, cache: &str, key: &str);

    /// Drop every entry of one named cache.
    async fn clear(&self, cache: &str);

    async fn len(&self, cache: &str) -> usize;
}

impl dyn CacheStore {
    /// Typed read. An entry that no longer deserializes is treated as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, cache: &str, key: &str) -> Option<T> {
        let value = self.get(cache, key).await?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(cache, key, error = %e, "Discarding undecodable cache entry");
                self.evict(cache, key).await;
                None
            }
        }
    }

    pub async fn put_json<T: Serialize + Sync>(&self, cache: &str, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(v) => self.put(cache, key, v).await,
            Err(e) => warn!(cache, key, error = %e, "Skipping cache write"),
        }
    }

    pub async fn clear_all(&self) {
        for cache in ALL_CACHES {
            self.clear(cache).await;
        }
    }
}

#[derive(Default)]
pub struct InMemoryCache {
    caches: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, cache: &str, key: &str) -> Option<Value> {
        let caches = self.caches.read().await;
        let hit = caches.get(cache).and_then(|entries| entries.get(key)).cloned();
        debug!(cache, key, hit = hit.is_some(), "Cache lookup");
        hit
    }

    async fn put(&self, cache: &str, key: &str, value: Value) {
        let mut caches = self.caches.write().await;
        caches
            .entry(cache.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    async fn evict(&self, cache: &str, key: &str) {
        let mut caches = self.caches.write().await;
        if let Some(entries) = caches.get_mut(cache) {
            entries.remove(key);
        }
    }

    async fn clear(&self, cache: &str) {
        let mut caches = self.caches.write().await;
        if let Some(entries) = caches.get_mut(cache) {
            entries.clear();
        }
    }

    async fn len(&self, cache: &str) -> usize {
        self.caches
            .read()
            .await
            .get(cache)
            .map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::Arc;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Summary {
        total: i32,
    }

    #[tokio::test]
    async fn test_put_get_evict() {
        let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new());

        cache
            .put_json(REPORT_CACHE, "u1_2024-01-01_2024-01-07", &Summary { total: 5 })
            .await;
        let hit: Option<Summary> = cache
            .get_json(REPORT_CACHE, "u1_2024-01-01_2024-01-07")
            .await;
        assert_eq!(hit, Some(Summary { total: 5 }));

        cache.evict(REPORT_CACHE, "u1_2024-01-01_2024-01-07").await;
        assert_eq!(cache.len(REPORT_CACHE).await, 0);
    }

    #[tokio::test]
    async fn test_caches_are_isolated_by_name() {
        let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new());
        cache.put(FOOD_CACHE, "1", Value::from(1)).await;
        cache.put(FOOD_SEARCH_CACHE, "1", Value::from(2)).await;

        cache.clear(FOOD_CACHE).await;
        assert!(cache.get(FOOD_CACHE, "1").await.is_none());
        assert_eq!(cache.get(FOOD_SEARCH_CACHE, "1").await, Some(Value::from(2)));

        cache.clear_all().await;
        assert_eq!(cache.len(FOOD_SEARCH_CACHE).await, 0);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new());
        cache.put(REPORT_CACHE, "k", Value::from("not a summary")).await;

        let hit: Option<Summary> = cache.get_json(REPORT_CACHE, "k").await;
        assert!(hit.is_none());
        assert!(cache.get(REPORT_CACHE, "k").await.is_none());
    }
}
