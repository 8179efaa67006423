//! Storage validators

use super::trait_def::Validate;
use crate::config::models::*;
use tracing::debug;
use url::Url;

impl Validate for StorageConfig {
    const SECTION: &'static str = "Storage";

    fn validate(&self) -> Result<(), String> {
        self.redis.validate()
    }
}

impl Validate for RedisConfig {
    const SECTION: &'static str = "Redis";

    fn validate(&self) -> Result<(), String> {
        debug!("Validating Redis configuration");

        if !self.enabled {
            return Ok(());
        }

        let url = Url::parse(&self.url).map_err(|e| format!("Invalid Redis URL: {}", e))?;
        match url.scheme() {
            "redis" | "rediss" | "unix" => {}
            scheme => return Err(format!("Unsupported Redis URL scheme: {}", scheme)),
        }

        if self.key_prefix.is_empty() || self.key_prefix.contains('*') {
            return Err("Redis key prefix must be non-empty and contain no wildcards".to_string());
        }

        Ok(())
    }
}
