//! Permission cache configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Permission cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionCacheConfig {
    /// Enable the user context tier
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// User context TTL in seconds
    #[serde(default = "default_context_ttl")]
    pub context_ttl_secs: u64,
    /// Enable the short-lived decision tier
    #[serde(default = "default_true")]
    pub decision_cache_enabled: bool,
    /// Decision TTL in seconds (at most 60)
    #[serde(default = "default_decision_ttl")]
    pub decision_ttl_secs: u64,
    /// Maximum decisions held in memory
    #[serde(default = "default_cache_max_capacity")]
    pub max_capacity: u64,
}

impl Default for PermissionCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            context_ttl_secs: default_context_ttl(),
            decision_cache_enabled: true,
            decision_ttl_secs: default_decision_ttl(),
            max_capacity: default_cache_max_capacity(),
        }
    }
}

impl PermissionCacheConfig {
    /// Merge cache configurations
    pub fn merge(mut self, other: Self) -> Self {
        if !other.enabled {
            self.enabled = false;
        }
        if other.context_ttl_secs != default_context_ttl() {
            self.context_ttl_secs = other.context_ttl_secs;
        }
        if !other.decision_cache_enabled {
            self.decision_cache_enabled = false;
        }
        if other.decision_ttl_secs != default_decision_ttl() {
            self.decision_ttl_secs = other.decision_ttl_secs;
        }
        if other.max_capacity != default_cache_max_capacity() {
            self.max_capacity = other.max_capacity;
        }
        self
    }

    pub fn context_ttl(&self) -> Duration {
        Duration::from_secs(self.context_ttl_secs)
    }

    pub fn decision_ttl(&self) -> Duration {
        Duration::from_secs(self.decision_ttl_secs)
    }
}
