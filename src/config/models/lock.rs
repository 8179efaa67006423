//! Entity lock configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lock coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// TTL used when a caller does not pass one
    #[serde(default = "default_lock_ttl_minutes")]
    pub default_ttl_minutes: u64,
    /// Upper bound for requested TTLs
    #[serde(default = "default_max_lock_ttl_minutes")]
    pub max_ttl_minutes: u64,
    /// Interval of the expired-lock sweeper, 0 disables it
    #[serde(default)]
    pub sweep_interval_secs: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            default_ttl_minutes: default_lock_ttl_minutes(),
            max_ttl_minutes: default_max_lock_ttl_minutes(),
            sweep_interval_secs: 0,
        }
    }
}

impl LockConfig {
    /// Merge lock configurations
    pub fn merge(mut self, other: Self) -> Self {
        if other.default_ttl_minutes != default_lock_ttl_minutes() {
            self.default_ttl_minutes = other.default_ttl_minutes;
        }
        if other.max_ttl_minutes != default_max_lock_ttl_minutes() {
            self.max_ttl_minutes = other.max_ttl_minutes;
        }
        if other.sweep_interval_secs != 0 {
            self.sweep_interval_secs = other.sweep_interval_secs;
        }
        self
    }

    /// Sweep interval, if the sweeper is enabled
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}
