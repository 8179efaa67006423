//! Storage configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Redis configuration for the shared cache and lock backends
    #[serde(default)]
    pub redis: RedisConfig,
}

impl StorageConfig {
    /// Merge storage configurations
    pub fn merge(mut self, other: Self) -> Self {
        self.redis = self.redis.merge(other.redis);
        self
    }
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Use Redis (if false, use in-memory backends)
    #[serde(default)]
    pub enabled: bool,
    /// Redis URL
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Prefix applied to every key written by the core
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl RedisConfig {
    /// Merge Redis configurations
    pub fn merge(mut self, other: Self) -> Self {
        if other.enabled {
            self.enabled = true;
        }
        if other.url != default_redis_url() {
            self.url = other.url;
        }
        if other.key_prefix != default_key_prefix() {
            self.key_prefix = other.key_prefix;
        }
        self
    }
}
