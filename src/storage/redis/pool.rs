//! Redis connection pool
//!
//! A single multiplexed connection shared by the cache backend and the lock
//! store.

use crate::config::RedisConfig;
use crate::utils::error::Result;
use redis::{Client, aio::MultiplexedConnection};
use tracing::{debug, info};

/// Redis connection pool
#[derive(Clone)]
pub struct RedisPool {
    connection: MultiplexedConnection,
    key_prefix: String,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPool")
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl RedisPool {
    /// Connect to Redis
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        info!("Creating Redis connection pool");
        debug!("Redis URL: {}", Self::sanitize_url(&config.url));

        let client = Client::open(config.url.as_str())?;
        let connection = client.get_multiplexed_async_connection().await?;

        info!("Redis connection pool created successfully");
        Ok(Self {
            connection,
            key_prefix: config.key_prefix.clone(),
        })
    }

    /// Handle on the shared connection
    pub fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        debug!("Performing Redis health check");
        let mut conn = self.connection();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        debug!("Redis health check passed");
        Ok(())
    }

    /// Sanitize Redis URL for logging (hide password)
    pub(crate) fn sanitize_url(url: &str) -> String {
        if let Ok(parsed) = url::Url::parse(url) {
            let mut sanitized = parsed.clone();
            if sanitized.password().is_some() {
                let _ = sanitized.set_password(Some("***"));
            }
            sanitized.to_string()
        } else {
            "invalid_url".to_string()
        }
    }
}

/// Collect every key matching `pattern` with incremental SCAN
pub(crate) async fn scan_keys(conn: &mut MultiplexedConnection, pattern: &str) -> Result<Vec<String>> {
    let mut cursor: u64 = 0;
    let mut keys = Vec::new();
    loop {
        let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(SCAN_BATCH)
            .query_async(conn)
            .await?;
        keys.extend(batch);
        if next == 0 {
            return Ok(keys);
        }
        cursor = next;
    }
}

const SCAN_BATCH: usize = 200;
