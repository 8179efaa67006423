//! Role/permission store adapter
//!
//! The relational store behind roles and permissions is an external
//! collaborator. The core reads it through [`RoleStore`] and writes it through
//! [`RoleAdminStore`]. [`MemoryRoleStore`] is the in-process implementation
//! used by tests, the CLI and single-node deployments.

use super::pattern::PermissionPattern;
use super::types::{Permission, PermissionId, Role, RoleId, UserId};
use crate::utils::error::{GuardError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Read side used by the context resolver
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Roles assigned to the user that are global or owned by `tenant_id`
    async fn get_roles_for_user(&self, user_id: &str, tenant_id: &str) -> Result<Vec<Role>>;

    /// Permissions currently granted to a role
    async fn get_permissions_for_role(&self, role_id: &str) -> Result<Vec<Permission>>;
}

/// Write side used by role administration
#[async_trait]
pub trait RoleAdminStore: RoleStore {
    async fn get_role(&self, role_id: &str) -> Result<Option<Role>>;
    async fn get_permission(&self, permission_id: &str) -> Result<Option<Permission>>;
    async fn list_roles(&self) -> Result<Vec<Role>>;
    /// Users holding a role
    async fn get_users_for_role(&self, role_id: &str) -> Result<Vec<UserId>>;
    /// Roles granting a permission
    async fn get_roles_with_permission(&self, permission_id: &str) -> Result<Vec<RoleId>>;
    async fn save_role(&self, role: Role) -> Result<()>;
    /// Returns false if the role did not exist
    async fn delete_role(&self, role_id: &str) -> Result<bool>;
    async fn save_permission(&self, permission: Permission) -> Result<()>;
    async fn delete_permission(&self, permission_id: &str) -> Result<bool>;
    async fn grant_permission(&self, role_id: &str, permission_id: &str) -> Result<()>;
    /// Returns false if the permission was not granted; missing records are errors
    async fn revoke_permission(&self, role_id: &str, permission_id: &str) -> Result<bool>;
    async fn assign_user(&self, user_id: &str, role_id: &str) -> Result<()>;
    /// Returns false if the user did not hold the role; a missing role is an error
    async fn unassign_user(&self, user_id: &str, role_id: &str) -> Result<bool>;
}

#[derive(Debug, Default)]
struct StoreState {
    roles: HashMap<RoleId, Role>,
    permissions: HashMap<PermissionId, Permission>,
    role_permissions: HashMap<RoleId, BTreeSet<PermissionId>>,
    user_roles: HashMap<UserId, BTreeSet<RoleId>>,
}

/// In-memory role/permission store
#[derive(Debug, Default)]
pub struct MemoryRoleStore {
    state: RwLock<StoreState>,
}

impl MemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the built-in platform roles
    pub fn with_defaults(super_admin_role: &str) -> Result<Self> {
        let store = Self::new();
        store.seed_platform_roles(super_admin_role)?;
        Ok(store)
    }

    /// Seed `super_admin` and `platform_auditor` plus the shared template permissions
    pub fn seed_platform_roles(&self, super_admin_role: &str) -> Result<()> {
        debug!("Seeding default platform roles");

        for (id, name, pattern) in DEFAULT_PERMISSIONS {
            self.insert_permission(Permission::new(*id, *name, pattern.parse::<PermissionPattern>()?));
        }

        self.insert_role(
            Role::global(super_admin_role, super_admin_role)
                .with_description("Unrestricted platform administration")
                .system(),
        );
        self.insert_role(
            Role::global("platform_auditor", "platform_auditor")
                .with_description("Read access across every tenant")
                .system(),
        );
        self.link("platform_auditor", "perm.read.global");

        debug!("Seeded {} default permissions", DEFAULT_PERMISSIONS.len());
        Ok(())
    }

    /// Seed the system roles every tenant starts with
    ///
    /// Role ids are `{tenant_id}:{role_name}`.
    pub fn seed_tenant_roles(&self, tenant_id: &str) {
        debug!(tenant_id, "Seeding default tenant roles");

        for (name, description, grants) in DEFAULT_TENANT_ROLES {
            let role_id = format!("{}:{}", tenant_id, name);
            self.insert_role(
                Role::for_tenant(role_id.clone(), *name, tenant_id)
                    .with_description(*description)
                    .system(),
            );
            for permission_id in *grants {
                self.link(&role_id, permission_id);
            }
        }
    }

    /// Insert or replace a role without any checks
    pub fn insert_role(&self, role: Role) {
        self.state.write().roles.insert(role.id.clone(), role);
    }

    /// Insert or replace a permission without any checks
    pub fn insert_permission(&self, permission: Permission) {
        self.state
            .write()
            .permissions
            .insert(permission.id.clone(), permission);
    }

    /// Grant a permission to a role without any checks
    pub fn link(&self, role_id: &str, permission_id: &str) {
        self.state
            .write()
            .role_permissions
            .entry(role_id.to_string())
            .or_default()
            .insert(permission_id.to_string());
    }

    /// Assign a role to a user without any checks
    pub fn assign(&self, user_id: &str, role_id: &str) {
        self.state
            .write()
            .user_roles
            .entry(user_id.to_string())
            .or_default()
            .insert(role_id.to_string());
    }

    pub fn has_role(&self, role_id: &str) -> bool {
        self.state.read().roles.contains_key(role_id)
    }

    pub fn has_permission(&self, permission_id: &str) -> bool {
        self.state.read().permissions.contains_key(permission_id)
    }

    pub fn role_count(&self) -> usize {
        self.state.read().roles.len()
    }

    pub fn permission_count(&self) -> usize {
        self.state.read().permissions.len()
    }
}

/// `(id, name, pattern)` of the shared template permissions
const DEFAULT_PERMISSIONS: &[(&str, &str, &str)] = &[
    ("perm.read.global", "Read anything on the platform", "*.read.global"),
    ("perm.all.tenant", "Manage everything in the tenant", "*.*.tenant"),
    ("perm.read.tenant", "Read everything in the tenant", "*.read.tenant"),
    ("perm.all.account", "Manage everything in the account", "*.*.account"),
    ("perm.all.own", "Manage own records", "*.*.own"),
    (
        "perm.locks.force_release",
        "Force-release entity locks in the tenant",
        "locks.force_release.tenant",
    ),
];

/// `(name, description, permission ids)` of the per-tenant system roles
const DEFAULT_TENANT_ROLES: &[(&str, &str, &[&str])] = &[
    (
        "tenant_admin",
        "Tenant administrator",
        &["perm.all.tenant", "perm.locks.force_release"],
    ),
    (
        "account_manager",
        "Manages one account of the tenant",
        &["perm.all.account", "perm.read.tenant"],
    ),
    ("member", "Regular tenant member", &["perm.read.tenant", "perm.all.own"]),
    ("viewer", "Read-only tenant access", &["perm.read.tenant"]),
];

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn get_roles_for_user(&self, user_id: &str, tenant_id: &str) -> Result<Vec<Role>> {
        let state = self.state.read();
        let Some(role_ids) = state.user_roles.get(user_id) else {
            return Ok(Vec::new());
        };

        Ok(role_ids
            .iter()
            .filter_map(|id| state.roles.get(id))
            .filter(|role| role.applies_to_tenant(tenant_id))
            .cloned()
            .collect())
    }

    async fn get_permissions_for_role(&self, role_id: &str) -> Result<Vec<Permission>> {
        let state = self.state.read();
        let Some(permission_ids) = state.role_permissions.get(role_id) else {
            return Ok(Vec::new());
        };

        Ok(permission_ids
            .iter()
            .filter_map(|id| state.permissions.get(id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RoleAdminStore for MemoryRoleStore {
    async fn get_role(&self, role_id: &str) -> Result<Option<Role>> {
        Ok(self.state.read().roles.get(role_id).cloned())
    }

    async fn get_permission(&self, permission_id: &str) -> Result<Option<Permission>> {
        Ok(self.state.read().permissions.get(permission_id).cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let mut roles: Vec<Role> = self.state.read().roles.values().cloned().collect();
        roles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(roles)
    }

    async fn get_users_for_role(&self, role_id: &str) -> Result<Vec<UserId>> {
        let state = self.state.read();
        let mut users: Vec<UserId> = state
            .user_roles
            .iter()
            .filter(|(_, roles)| roles.contains(role_id))
            .map(|(user, _)| user.clone())
            .collect();
        users.sort();
        Ok(users)
    }

    async fn get_roles_with_permission(&self, permission_id: &str) -> Result<Vec<RoleId>> {
        let state = self.state.read();
        let mut roles: Vec<RoleId> = state
            .role_permissions
            .iter()
            .filter(|(_, perms)| perms.contains(permission_id))
            .map(|(role, _)| role.clone())
            .collect();
        roles.sort();
        Ok(roles)
    }

    async fn save_role(&self, role: Role) -> Result<()> {
        self.insert_role(role);
        Ok(())
    }

    async fn delete_role(&self, role_id: &str) -> Result<bool> {
        let mut state = self.state.write();
        let existed = state.roles.remove(role_id).is_some();
        state.role_permissions.remove(role_id);
        for roles in state.user_roles.values_mut() {
            roles.remove(role_id);
        }
        Ok(existed)
    }

    async fn save_permission(&self, permission: Permission) -> Result<()> {
        self.insert_permission(permission);
        Ok(())
    }

    async fn delete_permission(&self, permission_id: &str) -> Result<bool> {
        let mut state = self.state.write();
        let existed = state.permissions.remove(permission_id).is_some();
        for perms in state.role_permissions.values_mut() {
            perms.remove(permission_id);
        }
        Ok(existed)
    }

    async fn grant_permission(&self, role_id: &str, permission_id: &str) -> Result<()> {
        {
            let state = self.state.read();
            if !state.roles.contains_key(role_id) {
                return Err(GuardError::role_not_found(role_id));
            }
            if !state.permissions.contains_key(permission_id) {
                return Err(GuardError::permission_not_found(permission_id));
            }
        }
        self.link(role_id, permission_id);
        Ok(())
    }

    async fn revoke_permission(&self, role_id: &str, permission_id: &str) -> Result<bool> {
        let mut state = self.state.write();
        if !state.roles.contains_key(role_id) {
            return Err(GuardError::role_not_found(role_id));
        }
        if !state.permissions.contains_key(permission_id) {
            return Err(GuardError::permission_not_found(permission_id));
        }
        Ok(state
            .role_permissions
            .get_mut(role_id)
            .is_some_and(|perms| perms.remove(permission_id)))
    }

    async fn assign_user(&self, user_id: &str, role_id: &str) -> Result<()> {
        if !self.state.read().roles.contains_key(role_id) {
            return Err(GuardError::role_not_found(role_id));
        }
        self.assign(user_id, role_id);
        Ok(())
    }

    async fn unassign_user(&self, user_id: &str, role_id: &str) -> Result<bool> {
        let mut state = self.state.write();
        if !state.roles.contains_key(role_id) {
            return Err(GuardError::role_not_found(role_id));
        }
        Ok(state
            .user_roles
            .get_mut(user_id)
            .is_some_and(|roles| roles.remove(role_id)))
    }
}
