use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use super::types::CacheEntry;
use super::{CacheBackend, CacheError};

/// Typed facade over a cache backend. Wraps values in positive or
/// negative entries and normalizes backend errors into [`CacheError`].
/// Positive entries use the repository's default TTL; negative entries
/// take an explicit (usually much shorter) one.
pub struct CacheRepository<T, B>
where
    T: Send + Sync + Clone + 'static,
    B: CacheBackend<T>,
{
    backend: B,
    default_ttl: Option<Duration>,
    _marker: PhantomData<T>,
}

impl<T, B> Clone for CacheRepository<T, B>
where
    T: Send + Sync + Clone + 'static,
    B: CacheBackend<T>,
{
    fn clone(&self) -> Self {
        CacheRepository {
            backend: self.backend.clone(),
            default_ttl: self.default_ttl,
            _marker: PhantomData,
        }
    }
}

impl<T, B> CacheRepository<T, B>
where
    T: Send + Sync + Clone + 'static,
    B: CacheBackend<T>,
{
    pub fn new(backend: B, default_ttl: Option<Duration>) -> Self {
        CacheRepository {
            backend,
            default_ttl,
            _marker: PhantomData,
        }
    }

    fn map_err(err: B::Error) -> CacheError {
        CacheError::BackendError(err.to_string())
    }

    /// Raw lookup that keeps the positive/negative distinction.
    /// `None` means the key was never cached (or expired).
    pub async fn get_entry(&self, key: &str) -> Result<Option<Arc<CacheEntry<T>>>, CacheError> {
        self.backend.get(key).await.map_err(Self::map_err)
    }

    /// Flattened lookup - negative entries and misses both come back as `None`
    #[allow(dead_code)]
    pub async fn get(&self, key: &str) -> Result<Option<Arc<T>>, CacheError> {
        let entry = self.get_entry(key).await?;
        Ok(entry.and_then(|entry| entry.data()))
    }

    pub async fn set_positive(&self, key: &str, value: &T) -> Result<(), CacheError> {
        self.backend
            .set(key, Arc::new(CacheEntry::positive(value.clone())), self.default_ttl)
            .await
            .map_err(Self::map_err)
    }

    pub async fn set_negative(&self, key: &str, ttl: Duration) -> Result<(), CacheError> {
        self.backend
            .set(key, Arc::new(CacheEntry::negative()), Some(ttl))
            .await
            .map_err(Self::map_err)
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.backend.delete(key).await.map_err(Self::map_err)
    }

    #[allow(dead_code)]
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.backend.clear().await.map_err(Self::map_err)
    }

    #[allow(dead_code)]
    pub async fn mget(&self, keys: &[&str]) -> Result<Vec<Option<Arc<CacheEntry<T>>>>, CacheError> {
        self.backend.mget(keys).await.map_err(Self::map_err)
    }

    #[allow(dead_code)]
    pub async fn mset_positive(&self, entries: &[(String, T)]) -> Result<(), CacheError> {
        let wrapped: Vec<(&str, Arc<CacheEntry<T>>)> = entries
            .iter()
            .map(|(key, value)| (key.as_str(), Arc::new(CacheEntry::positive(value.clone()))))
            .collect();
        self.backend.mset(&wrapped, self.default_ttl).await.map_err(Self::map_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::cache::memory::MemoryCacheBackend;

    #[derive(Debug, Clone, PartialEq)]
    struct TestItem {
        id: u32,
        name: String,
    }

    fn repo() -> CacheRepository<TestItem, MemoryCacheBackend<TestItem>> {
        CacheRepository::new(MemoryCacheBackend::new(), None)
    }

    fn item(id: u32, name: &str) -> TestItem {
        TestItem {
            id,
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn positive_entry_round_trips() {
        let repo = repo();

        repo.set_positive("item:1", &item(1, "first")).await.unwrap();
        let entry = repo.get_entry("item:1").await.unwrap().unwrap();

        assert!(matches!(entry.as_ref(), CacheEntry::Positive(_)));
        assert_eq!(*entry.data().unwrap(), item(1, "first"));
    }

    #[tokio::test]
    async fn negative_entry_differs_from_miss() {
        let repo = repo();

        repo.set_negative("item:2", Duration::from_secs(60)).await.unwrap();

        let cached = repo.get_entry("item:2").await.unwrap();
        assert!(matches!(cached.as_deref(), Some(CacheEntry::Negative)));

        let missing = repo.get_entry("item:3").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn flattened_get_hides_negative_entries() {
        let repo = repo();

        repo.set_positive("item:1", &item(1, "first")).await.unwrap();
        repo.set_negative("item:2", Duration::from_secs(60)).await.unwrap();

        assert!(repo.get("item:1").await.unwrap().is_some());
        assert!(repo.get("item:2").await.unwrap().is_none());
        assert!(repo.get("item:3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn default_ttl_expires_positive_entries() {
        let repo: CacheRepository<TestItem, MemoryCacheBackend<TestItem>> =
            CacheRepository::new(MemoryCacheBackend::new(), Some(Duration::from_millis(10)));

        repo.set_positive("item:1", &item(1, "first")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(repo.get_entry("item:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_forgets_the_key() {
        let repo = repo();

        repo.set_positive("item:1", &item(1, "first")).await.unwrap();
        repo.delete("item:1").await.unwrap();

        assert!(repo.get_entry("item:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn batch_set_then_batch_get() {
        let repo = repo();

        repo.mset_positive(&[
            ("item:1".to_string(), item(1, "first")),
            ("item:2".to_string(), item(2, "second")),
        ])
        .await
        .unwrap();

        let entries = repo.mget(&["item:1", "item:9", "item:2"]).await.unwrap();
        assert!(entries[0].is_some());
        assert!(entries[1].is_none());
        assert_eq!(*entries[2].as_ref().unwrap().data().unwrap(), item(2, "second"));
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let repo = repo();

        repo.set_positive("item:1", &item(1, "first")).await.unwrap();
        repo.set_negative("item:2", Duration::from_secs(60)).await.unwrap();
        repo.clear().await.unwrap();

        assert!(repo.get_entry("item:1").await.unwrap().is_none());
        assert!(repo.get_entry("item:2").await.unwrap().is_none());
    }
}
