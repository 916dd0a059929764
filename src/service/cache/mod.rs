use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use self::types::CacheEntry;

pub mod memory;
pub mod metrics;
pub mod repository;
pub mod types;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Simplified cache backend trait - basic KV operations only
#[async_trait]
pub trait CacheBackend<T>: Send + Sync + Clone + 'static
where
    T: Send + Sync + Clone + 'static,
{
    type Error: std::error::Error + Send + Sync + 'static;

    // Basic operations
    async fn get(&self, key: &str) -> Result<Option<std::sync::Arc<CacheEntry<T>>>, Self::Error>;
    async fn set(&self, key: &str, value: std::sync::Arc<CacheEntry<T>>, ttl: Option<Duration>) -> Result<(), Self::Error>;
    async fn delete(&self, key: &str) -> Result<(), Self::Error>;
    async fn clear(&self) -> Result<(), Self::Error>;

    // Batch operations (for performance)
    async fn mget(&self, keys: &[&str]) -> Result<Vec<Option<std::sync::Arc<CacheEntry<T>>>>, Self::Error>;
    async fn mset(&self, entries: &[(&str, std::sync::Arc<CacheEntry<T>>)], ttl: Option<Duration>) -> Result<(), Self::Error>;
}
