//! Post caching with Redis.
//!
//! Read paths for single posts and the unfiltered listing go through a
//! cache-aside layer. Filtered listings always hit the database, so
//! writes only ever have two keys to invalidate.

use async_trait::async_trait;
use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use quill_common::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Cache key for a single post.
#[must_use]
pub fn post_key(post_id: &str) -> String {
    format!("post:{post_id}")
}

/// Cache key for the unfiltered post listing.
#[must_use]
pub const fn post_list_key() -> &'static str {
    "posts:all"
}

/// Key-value cache with a fixed TTL, used by the post read path.
#[async_trait]
pub trait PostCache: Send + Sync {
    /// Fetch a cached value.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Store a value under the configured TTL.
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Drop a key.
    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// Shared cache handle.
pub type CacheService = Arc<dyn PostCache>;

/// Redis-backed cache.
#[derive(Clone)]
pub struct RedisCache {
    redis: Arc<RedisClient>,
    prefix: String,
    ttl_secs: i64,
}

impl RedisCache {
    /// Create a new Redis cache.
    #[must_use]
    pub const fn new(redis: Arc<RedisClient>, prefix: String, ttl_secs: i64) -> Self {
        Self {
            redis,
            prefix,
            ttl_secs,
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

#[async_trait]
impl PostCache for RedisCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let result: Option<String> = self
            .redis
            .get(self.full_key(key))
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;

        if result.is_some() {
            debug!(key = %key, "Cache hit");
        } else {
            debug!(key = %key, "Cache miss");
        }

        Ok(result)
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.redis
            .set::<(), _, _>(
                self.full_key(key),
                value,
                Some(Expiration::EX(self.ttl_secs)),
                None,
                false,
            )
            .await
            .map_err(|e| AppError::Cache(e.to_string()))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.redis
            .del::<(), _>(self.full_key(key))
            .await
            .map_err(|e| AppError::Cache(e.to_string()))
    }
}

/// In-process cache for tests and single-node development setups.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
    ttl: Duration,
}

impl MemoryCache {
    /// Create a new in-memory cache.
    #[must_use]
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::from_secs(ttl_secs.max(0) as u64),
        }
    }
}

#[async_trait]
impl PostCache for MemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).and_then(|(value, expires_at)| {
            if Instant::now() < *expires_at {
                Some(value.clone())
            } else {
                None
            }
        }))
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + self.ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}

/// Cache that stores nothing. Every read is a miss.
pub struct NoOpCache;

#[async_trait]
impl PostCache for NoOpCache {
    async fn get(&self, _key: &str) -> AppResult<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str) -> AppResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_post_key() {
        assert_eq!(post_key("abc"), "post:abc");
    }

    #[tokio::test]
    async fn test_memory_cache_roundtrip() {
        let cache = MemoryCache::new(60);
        cache.set("post:1", "{}").await.unwrap();

        assert_eq!(cache.get("post:1").await.unwrap().as_deref(), Some("{}"));

        cache.delete("post:1").await.unwrap();
        assert!(cache.get("post:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_cache_expiry() {
        let cache = MemoryCache::new(0);
        cache.set("post:1", "{}").await.unwrap();

        assert!(cache.get("post:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_noop_cache_always_misses() {
        let cache = NoOpCache;
        cache.set("post:1", "{}").await.unwrap();

        assert!(cache.get("post:1").await.unwrap().is_none());
    }
}
