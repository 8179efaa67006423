//! Redis cache backend

use super::pool::{RedisPool, scan_keys};
use crate::core::traits::CacheBackend;
use crate::utils::error::Result;
use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::debug;

/// [`CacheBackend`] shared across processes through Redis
#[derive(Debug, Clone)]
pub struct RedisCacheBackend {
    pool: RedisPool,
}

impl RedisCacheBackend {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.pool.connection();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.pool.connection();
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(millis)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.pool.connection();
        let removed: usize = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<usize> {
        let mut conn = self.pool.connection();
        let keys = scan_keys(&mut conn, pattern).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let mut removed = 0;
        for chunk in keys.chunks(500) {
            let count: usize = conn.del(chunk).await?;
            removed += count;
        }
        debug!(pattern, removed, "Deleted Redis keys by pattern");
        Ok(removed)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
