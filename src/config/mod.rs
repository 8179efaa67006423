//! Configuration management for the access core
//!
//! This module handles loading, validation, and merging of configuration.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::{Validate, validate_section};

use crate::utils::error::{GuardError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Permission resolution
    #[serde(default)]
    pub rbac: RbacConfig,
    /// User context and decision caches
    #[serde(default)]
    pub cache: PermissionCacheConfig,
    /// Entity locks
    #[serde(default)]
    pub locks: LockConfig,
    /// Audit emission
    #[serde(default)]
    pub audit: AuditConfig,
    /// Shared backends
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GuardError::config(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_yaml(&content)?;
        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| GuardError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Ok(role) = std::env::var("TENANT_GUARD_SUPER_ADMIN_ROLE") {
            config.rbac.super_admin_role = role;
        }
        if let Some(ttl) = env_u64("TENANT_GUARD_CONTEXT_TTL_SECS")? {
            config.cache.context_ttl_secs = ttl;
        }
        if let Some(ttl) = env_u64("TENANT_GUARD_DECISION_TTL_SECS")? {
            config.cache.decision_ttl_secs = ttl;
        }
        if let Some(ttl) = env_u64("TENANT_GUARD_LOCK_TTL_MINUTES")? {
            config.locks.default_ttl_minutes = ttl;
        }
        if let Ok(url) = std::env::var("TENANT_GUARD_REDIS_URL") {
            config.storage.redis.enabled = true;
            config.storage.redis.url = url;
        }
        if let Ok(level) = std::env::var("TENANT_GUARD_LOG") {
            config.logging.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        validate_section(&self.rbac)?;
        validate_section(&self.cache)?;
        validate_section(&self.locks)?;
        validate_section(&self.audit)?;
        validate_section(&self.storage)?;

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        self.rbac = self.rbac.merge(other.rbac);
        self.cache = self.cache.merge(other.cache);
        self.locks = self.locks.merge(other.locks);
        self.audit = self.audit.merge(other.audit);
        self.storage = self.storage.merge(other.storage);
        self.logging = self.logging.merge(other.logging);
        self
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| GuardError::config(format!("Failed to serialize config to YAML: {}", e)))
    }
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|e| GuardError::config(format!("{} must be an integer: {}", name, e))),
        Err(_) => Ok(None),
    }
}
