use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::{Expiry, future::Cache};
use tracing::debug;

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::declare_object_cache_plugin;

declare_object_cache_plugin!("moka", MokaObjectCache);

#[derive(Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// 按条目 TTL 过期
struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _now: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// 进程内缓存，单实例部署时使用
pub struct MokaObjectCache {
    inner: Cache<String, Entry>,
    default_ttl: Duration,
}

impl MokaObjectCache {
    pub fn new() -> Result<Self, String> {
        let config = AppConfig::get();
        Ok(Self::with_settings(
            config.cache.memory.max_capacity,
            config.cache.default_ttl,
        ))
    }

    pub fn with_settings(max_capacity: u64, default_ttl: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .build();

        debug!("Moka 缓存已创建, 容量 {}, 默认 TTL {}s", max_capacity, default_ttl);
        Self {
            inner,
            default_ttl: Duration::from_secs(default_ttl.max(1)),
        }
    }
}

#[async_trait]
impl ObjectCache for MokaObjectCache {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        match self.inner.get(key).await {
            Some(entry) => CacheResult::Found(entry.value),
            None => CacheResult::NotFound,
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        let ttl = if ttl == 0 {
            self.default_ttl
        } else {
            Duration::from_secs(ttl)
        };
        self.inner.insert(key, Entry { value, ttl }).await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    async fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ObjectCacheExt;

    #[tokio::test]
    async fn test_insert_get_remove() {
        let cache = MokaObjectCache::with_settings(100, 60);
        cache.insert_raw("k".to_string(), "v".to_string(), 0).await;
        assert_eq!(cache.get_raw("k").await, CacheResult::Found("v".to_string()));

        cache.remove("k").await;
        assert_eq!(cache.get_raw("k").await, CacheResult::NotFound);
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let cache = MokaObjectCache::with_settings(100, 60);
        cache.insert_json("ids".to_string(), &vec![1, 2, 3], 30).await;
        let ids: CacheResult<Vec<i64>> = cache.get_json("ids").await;
        assert_eq!(ids.into_option(), Some(vec![1, 2, 3]));

        cache.insert_raw("bad".to_string(), "not json".to_string(), 30).await;
        let bad: CacheResult<Vec<i64>> = cache.get_json("bad").await;
        assert_eq!(bad, CacheResult::ExistsButNoValue);
    }
}
