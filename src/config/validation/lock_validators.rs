//! Lock and audit validators

use super::trait_def::Validate;
use crate::config::models::*;
use tracing::debug;

impl Validate for LockConfig {
    const SECTION: &'static str = "Lock";

    fn validate(&self) -> Result<(), String> {
        debug!("Validating lock configuration");

        if self.default_ttl_minutes == 0 {
            return Err("Default lock TTL must be greater than 0".to_string());
        }

        if self.max_ttl_minutes < self.default_ttl_minutes {
            return Err("Maximum lock TTL must not be below the default TTL".to_string());
        }

        Ok(())
    }
}

impl Validate for AuditConfig {
    const SECTION: &'static str = "Audit";

    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.buffer_size == 0 {
            return Err("Audit buffer size must be greater than 0".to_string());
        }
        Ok(())
    }
}
