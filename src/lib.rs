//! # tenant-guard
//!
//! Access-control and concurrency-coordination core for multi-tenant
//! platforms.
//!
//! ## Features
//!
//! - **Wildcard permissions**: `resource.action.scope` patterns such as
//!   `bundles.*.global`, matched structurally per segment
//! - **Four-tier scopes**: `own`, `account`, `tenant` and `global`, with
//!   tenant, account and ownership boundaries checked per request
//! - **Cached contexts**: resolved user contexts and recent decisions are
//!   cached and explicitly invalidated on every role mutation
//! - **Entity locks**: advisory TTL-bounded locks per
//!   `(tenant, entity type, entity id)` with force-release for administrators
//! - **Audit trail**: every decision and lock transition is emitted to a
//!   pluggable sink
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tenant_guard::{AccessCore, AccessRequest, Config, Principal, Scope};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let core = AccessCore::builder(Config::default()).build().await?;
//!
//!     let principal = Principal::new("user-7", "tenant-1");
//!     let decision = core
//!         .check(&principal, &AccessRequest::new("read", "jobs", Scope::Tenant))
//!         .await;
//!     println!("allowed: {} ({})", decision.allowed, decision.reason);
//!
//!     let outcome = core
//!         .acquire_lock("tenant-1", "job", "42", "user-7", "editing", Some(30))
//!         .await?;
//!     println!("lock: {}", outcome);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod audit;
pub mod auth;
pub mod config;
pub mod core;
pub mod locks;
pub mod storage;
pub mod utils;

// Re-export main types
pub use audit::{AuditEmitter, AuditEvent, AuditEventType, AuditSink};
pub use auth::{
    AccessDecision, AccessRequest, DecisionReason, MemoryRoleStore, Permission, PermissionPattern,
    PermissionService, PolicySeed, Principal, ResourceTarget, Role, RoleAdmin, Scope, UserContext,
};
pub use config::Config;
pub use core::{AccessCore, AccessCoreBuilder};
pub use locks::{EntityLock, LockCoordinator, LockInfo, LockKey, LockOutcome};
pub use utils::error::{GuardError, Result};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    /// Seconds since the epoch at build time
    pub build_time: &'static str,
    pub git_hash: &'static str,
    pub rust_version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: VERSION,
            build_time: env!("TENANT_GUARD_BUILD_TIME"),
            git_hash: env!("TENANT_GUARD_GIT_HASH"),
            rust_version: env!("TENANT_GUARD_RUST_VERSION"),
        }
    }
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} (git {}, built {}, {})",
            NAME, self.version, self.git_hash, self.build_time, self.rust_version
        )
    }
}

pub fn build_info() -> BuildInfo {
    BuildInfo::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info() {
        let info = build_info();
        assert!(!info.version.is_empty());
        assert_eq!(info.version, VERSION);
        assert!(!info.git_hash.is_empty());

        let line = info.to_string();
        assert!(line.starts_with(&format!("tenant-guard {}", VERSION)));
        assert!(line.contains(info.git_hash));
    }

    #[test]
    fn test_constants() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(NAME, "tenant-guard");
    }
}
