//! Audit emitter configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Audit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Emit audit events
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Bounded channel size between callers and the sink
    #[serde(default = "default_audit_buffer_size")]
    pub buffer_size: usize,
    /// Drop events when the buffer is full; otherwise wait for room in a
    /// spawned task
    #[serde(default = "default_true")]
    pub drop_on_overflow: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            buffer_size: default_audit_buffer_size(),
            drop_on_overflow: true,
        }
    }
}

impl AuditConfig {
    /// Merge audit configurations
    pub fn merge(mut self, other: Self) -> Self {
        if !other.enabled {
            self.enabled = false;
        }
        if other.buffer_size != default_audit_buffer_size() {
            self.buffer_size = other.buffer_size;
        }
        if !other.drop_on_overflow {
            self.drop_on_overflow = false;
        }
        self
    }
}
