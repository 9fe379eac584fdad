use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tracing::{debug, error, warn};

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::declare_object_cache_plugin;

declare_object_cache_plugin!("redis", RedisObjectCache);

/// 多实例部署共享的 Redis 缓存
pub struct RedisObjectCache {
    client: redis::Client,
    key_prefix: String,
    ttl: u64, // 秒
}

impl RedisObjectCache {
    pub fn new() -> Result<Self, String> {
        let config = AppConfig::get();
        let redis_config = &config.cache.redis;

        let client = redis::Client::open(redis_config.url.clone())
            .map_err(|e| format!("Redis 地址无效 {}: {e}", redis_config.url))?;

        // 启动时同步 PING 一次，失败则回退到内存缓存
        let mut conn = client.get_connection().map_err(|e| {
            error!("无法连接 Redis {}: {}", redis_config.url, e);
            format!("Redis 连接失败: {e}")
        })?;
        let pong: String = redis::cmd("PING").query(&mut conn).map_err(|e| {
            error!("Redis PING 失败 {}: {}", redis_config.url, e);
            format!("Redis PING 失败: {e}")
        })?;
        debug!("Redis 连接正常: {}", pong);

        Ok(Self {
            client,
            key_prefix: redis_config.key_prefix.clone(),
            ttl: config.cache.default_ttl,
        })
    }

    async fn connection(&self) -> Option<MultiplexedConnection> {
        match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => Some(conn),
            Err(e) => {
                error!("获取 Redis 连接失败: {}", e);
                None
            }
        }
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl ObjectCache for RedisObjectCache {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        let redis_key = self.make_key(key);

        let Some(mut conn) = self.connection().await else {
            return CacheResult::ExistsButNoValue;
        };

        let result: redis::RedisResult<Option<String>> = conn.get(redis_key).await;

        match result {
            Ok(Some(data)) => CacheResult::Found(data),
            Ok(None) => CacheResult::NotFound,
            Err(e) => {
                error!("读取缓存 {} 失败: {}", key, e);
                CacheResult::ExistsButNoValue
            }
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        let redis_key = self.make_key(&key);

        let Some(mut conn) = self.connection().await else {
            return;
        };

        let effective_ttl = if ttl == 0 { self.ttl } else { ttl };

        if let Err(e) = conn
            .set_ex::<String, String, ()>(redis_key, value, effective_ttl)
            .await
        {
            error!("写入缓存 {} 失败: {}", key, e);
        }
    }

    async fn remove(&self, key: &str) {
        let redis_key = self.make_key(key);

        let Some(mut conn) = self.connection().await else {
            return;
        };

        if let Err(e) = conn.del::<String, i32>(redis_key).await {
            error!("删除缓存 {} 失败: {}", key, e);
        }
    }

    async fn invalidate_all(&self) {
        // 共享实例上不做 FLUSHDB，避免清掉其他服务的键
        warn!("Redis 缓存不支持 invalidate_all, 已忽略");
    }
}
