//! Configuration data models
//!
//! This module defines all configuration structures used by the access core.

pub mod audit;
pub mod cache;
pub mod lock;
pub mod logging;
pub mod rbac;
pub mod storage;

pub use audit::*;
pub use cache::*;
pub use lock::*;
pub use logging::*;
pub use rbac::*;
pub use storage::*;

/// Default values for configuration
pub fn default_true() -> bool {
    true
}

/// Reserved name of the platform super-admin role
pub fn default_super_admin_role() -> String {
    "super_admin".to_string()
}

/// Actions that qualify for the read-only fallback
pub fn default_read_actions() -> Vec<String> {
    vec!["read".to_string(), "list".to_string(), "view".to_string()]
}

/// Permission required to force-release another user's lock
pub fn default_force_release_permission() -> String {
    "locks.force_release.tenant".to_string()
}

/// User context cache TTL in seconds
pub fn default_context_ttl() -> u64 {
    300 // 5 minutes
}

/// Decision cache TTL in seconds
pub fn default_decision_ttl() -> u64 {
    30
}

pub fn default_cache_max_capacity() -> u64 {
    10_000
}

pub fn default_lock_ttl_minutes() -> u64 {
    30
}

pub fn default_max_lock_ttl_minutes() -> u64 {
    24 * 60
}

pub fn default_audit_buffer_size() -> usize {
    10_000
}

pub fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

pub fn default_key_prefix() -> String {
    "tenant_guard".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}
