//! Policy seed files
//!
//! A YAML description of roles, permissions, grants and assignments used to
//! populate a [`MemoryRoleStore`] for the CLI and for tests.

use super::store::MemoryRoleStore;
use super::types::{Permission, Role};
use crate::utils::error::{GuardError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Permissions granted to one role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantSeed {
    pub role: String,
    pub permissions: Vec<String>,
}

/// Roles assigned to one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentSeed {
    pub user: String,
    pub roles: Vec<String>,
}

/// Contents of a policy seed file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicySeed {
    /// Seed the built-in platform roles
    #[serde(default)]
    pub include_defaults: bool,
    /// Tenants that get the built-in tenant roles
    #[serde(default)]
    pub tenants: Vec<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub grants: Vec<GrantSeed>,
    #[serde(default)]
    pub assignments: Vec<AssignmentSeed>,
}

impl PolicySeed {
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_yaml(&content)
    }
}

impl MemoryRoleStore {
    /// Build a store from a policy seed
    ///
    /// Grants and assignments must reference roles and permissions that exist
    /// after seeding.
    pub fn from_seed(seed: &PolicySeed, super_admin_role: &str) -> Result<Self> {
        let store = if seed.include_defaults {
            Self::with_defaults(super_admin_role)?
        } else {
            Self::new()
        };

        for tenant in &seed.tenants {
            store.seed_tenant_roles(tenant);
        }
        for role in &seed.roles {
            store.insert_role(role.clone());
        }
        for permission in &seed.permissions {
            store.insert_permission(permission.clone());
        }

        for grant in &seed.grants {
            if !store.has_role(&grant.role) {
                return Err(GuardError::role_not_found(&grant.role));
            }
            for permission_id in &grant.permissions {
                if !store.has_permission(permission_id) {
                    return Err(GuardError::permission_not_found(permission_id));
                }
                store.link(&grant.role, permission_id);
            }
        }

        for assignment in &seed.assignments {
            for role_id in &assignment.roles {
                if !store.has_role(role_id) {
                    return Err(GuardError::role_not_found(role_id));
                }
                store.assign(&assignment.user, role_id);
            }
        }

        info!(
            roles = store.role_count(),
            permissions = store.permission_count(),
            "Loaded policy seed"
        );
        Ok(store)
    }
}
