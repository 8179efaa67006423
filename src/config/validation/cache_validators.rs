//! Cache validators

use super::trait_def::Validate;
use crate::config::models::*;
use tracing::debug;

/// Longest TTL allowed for cached decisions
pub(super) const MAX_DECISION_TTL_SECS: u64 = 60;

impl Validate for PermissionCacheConfig {
    const SECTION: &'static str = "Cache";

    fn validate(&self) -> Result<(), String> {
        debug!("Validating cache configuration");

        if self.enabled && self.context_ttl_secs == 0 {
            return Err("Context TTL must be greater than 0 when caching is enabled".to_string());
        }

        if self.decision_cache_enabled {
            if self.decision_ttl_secs == 0 {
                return Err("Decision TTL must be greater than 0".to_string());
            }
            if self.decision_ttl_secs > MAX_DECISION_TTL_SECS {
                return Err(format!(
                    "Decision TTL must not exceed {} seconds",
                    MAX_DECISION_TTL_SECS
                ));
            }
        }

        if self.max_capacity == 0 {
            return Err("Cache capacity must be greater than 0".to_string());
        }

        Ok(())
    }
}
