use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::metrics::CacheMetrics;
use super::types::CacheEntry;
use super::{CacheBackend, CacheError};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// In-process cache backend backed by a concurrent hash map.
/// Entries carry an optional deadline; a background task sweeps
/// expired ones so the map does not grow unbounded between reads.
pub struct MemoryCacheBackend<T>
where
    T: Send + Sync + Clone + 'static,
{
    store: Arc<DashMap<String, (Arc<CacheEntry<T>>, Option<Instant>)>>,
    metrics: CacheMetrics,
}

impl<T> Clone for MemoryCacheBackend<T>
where
    T: Send + Sync + Clone + 'static,
{
    fn clone(&self) -> Self {
        MemoryCacheBackend {
            store: self.store.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<T> Default for MemoryCacheBackend<T>
where
    T: Send + Sync + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemoryCacheBackend<T>
where
    T: Send + Sync + Clone + 'static,
{
    pub fn new() -> Self {
        let backend = MemoryCacheBackend {
            store: Arc::new(DashMap::new()),
            metrics: CacheMetrics::new(),
        };
        backend.start_cleanup_task();
        backend
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let backend = MemoryCacheBackend {
            store: Arc::new(DashMap::with_capacity(capacity)),
            metrics: CacheMetrics::new(),
        };
        backend.start_cleanup_task();
        backend
    }

    #[allow(dead_code)]
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    fn expires_at(ttl: Option<Duration>) -> Option<Instant> {
        ttl.map(|ttl| Instant::now() + ttl)
    }

    fn is_expired(deadline: &Option<Instant>) -> bool {
        match deadline {
            Some(deadline) => Instant::now() >= *deadline,
            None => false,
        }
    }

    fn start_cleanup_task(&self) {
        let store = self.store.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            interval.tick().await;
            loop {
                interval.tick().await;
                let before = store.len();
                store.retain(|_, (_, deadline)| !Self::is_expired(deadline));
                let removed = before.saturating_sub(store.len());
                if removed > 0 {
                    debug!("memory cache cleanup removed {} expired entries", removed);
                }
            }
        });
    }
}

#[async_trait]
impl<T> CacheBackend<T> for MemoryCacheBackend<T>
where
    T: Send + Sync + Clone + 'static,
{
    type Error = CacheError;

    async fn get(&self, key: &str) -> Result<Option<Arc<CacheEntry<T>>>, Self::Error> {
        match self.store.get(key) {
            Some(slot) => {
                let (entry, deadline) = slot.value();
                if Self::is_expired(deadline) {
                    drop(slot);
                    self.store.remove(key);
                    self.metrics.record_miss();
                    return Ok(None);
                }
                self.metrics.record_hit();
                Ok(Some(entry.clone()))
            }
            None => {
                self.metrics.record_miss();
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Arc<CacheEntry<T>>, ttl: Option<Duration>) -> Result<(), Self::Error> {
        self.store.insert(key.to_string(), (value, Self::expires_at(ttl)));
        self.metrics.record_set();
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Self::Error> {
        self.store.remove(key);
        self.metrics.record_delete();
        Ok(())
    }

    async fn clear(&self) -> Result<(), Self::Error> {
        self.store.clear();
        Ok(())
    }

    async fn mget(&self, keys: &[&str]) -> Result<Vec<Option<Arc<CacheEntry<T>>>>, Self::Error> {
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            results.push(self.get(key).await?);
        }
        Ok(results)
    }

    async fn mset(&self, entries: &[(&str, Arc<CacheEntry<T>>)], ttl: Option<Duration>) -> Result<(), Self::Error> {
        for (key, value) in entries {
            self.set(key, value.clone(), ttl).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(value: &str) -> Arc<CacheEntry<String>> {
        Arc::new(CacheEntry::positive(value.to_string()))
    }

    #[tokio::test]
    async fn set_then_get_returns_entry() {
        let backend: MemoryCacheBackend<String> = MemoryCacheBackend::new();

        backend.set("greeting", entry("hello"), None).await.unwrap();
        let fetched = backend.get("greeting").await.unwrap().unwrap();

        assert_eq!(fetched.data().unwrap().as_str(), "hello");
    }

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let backend: MemoryCacheBackend<String> = MemoryCacheBackend::new();

        assert!(backend.get("absent").await.unwrap().is_none());
        assert_eq!(backend.metrics().misses(), 1);
    }

    #[tokio::test]
    async fn negative_entries_round_trip() {
        let backend: MemoryCacheBackend<String> = MemoryCacheBackend::new();

        backend
            .set("gone", Arc::new(CacheEntry::negative()), None)
            .await
            .unwrap();
        let fetched = backend.get("gone").await.unwrap().unwrap();

        assert!(matches!(fetched.as_ref(), CacheEntry::Negative));
        assert!(fetched.data().is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_dropped_on_read() {
        let backend: MemoryCacheBackend<String> = MemoryCacheBackend::new();

        backend
            .set("ephemeral", entry("soon gone"), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(backend.get("ephemeral").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let backend: MemoryCacheBackend<String> = MemoryCacheBackend::new();

        backend.set("doomed", entry("bye"), None).await.unwrap();
        backend.delete("doomed").await.unwrap();

        assert!(backend.get("doomed").await.unwrap().is_none());
        assert_eq!(backend.metrics().deletes(), 1);
    }

    #[tokio::test]
    async fn clear_empties_the_store() {
        let backend: MemoryCacheBackend<String> = MemoryCacheBackend::new();

        backend.set("a", entry("1"), None).await.unwrap();
        backend.set("b", entry("2"), None).await.unwrap();
        backend.clear().await.unwrap();

        assert!(backend.get("a").await.unwrap().is_none());
        assert!(backend.get("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn batch_operations_cover_all_keys() {
        let backend: MemoryCacheBackend<String> = MemoryCacheBackend::with_capacity(8);

        backend
            .mset(&[("a", entry("1")), ("b", entry("2"))], None)
            .await
            .unwrap();
        let results = backend.mget(&["a", "missing", "b"]).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_some());
        assert!(results[1].is_none());
        assert!(results[2].is_some());
    }

    #[tokio::test]
    async fn metrics_track_hits_and_misses() {
        let backend: MemoryCacheBackend<String> = MemoryCacheBackend::new();

        backend.set("key", entry("value"), None).await.unwrap();
        backend.get("key").await.unwrap();
        backend.get("other").await.unwrap();

        assert_eq!(backend.metrics().hits(), 1);
        assert_eq!(backend.metrics().misses(), 1);
        assert_eq!(backend.metrics().sets(), 1);
    }
}
