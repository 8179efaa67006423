//! Cache backend trait
//!
//! Byte-oriented key/value cache with per-entry TTL and glob-pattern
//! deletion, implemented in memory and (behind the `redis` feature) by Redis.

use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Generic cache backend
///
/// Patterns passed to [`delete_by_pattern`](CacheBackend::delete_by_pattern)
/// use `*` as the only wildcard, matching any run of characters.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a value, `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a value for `ttl`
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Delete a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Delete every key matching `pattern`, returning the number removed
    async fn delete_by_pattern(&self, pattern: &str) -> Result<usize>;

    /// Reclaim expired entries; backends with native expiry have nothing to do
    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }

    /// Backend name for logs
    fn name(&self) -> &'static str;
}
