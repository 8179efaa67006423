//! Role administration
//!
//! Every mutation is written to the store first and only then invalidates the
//! cached contexts of the users it affects.

use super::cache::PermissionCache;
use super::pattern::PermissionPattern;
use super::store::RoleAdminStore;
use super::types::{Permission, Principal, Role, RoleId, UserId};
use crate::audit::{AuditEmitter, AuditEvent, AuditEventType};
use crate::utils::error::{GuardError, Result};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Requested change to an existing permission
#[derive(Debug, Clone, Default)]
pub struct PermissionUpdate {
    pub name: Option<String>,
    pub pattern: Option<PermissionPattern>,
    pub priority: Option<i32>,
}

/// Administrative operations on roles, permissions and assignments
#[derive(Clone)]
pub struct RoleAdmin {
    store: Arc<dyn RoleAdminStore>,
    cache: Arc<PermissionCache>,
    audit: Arc<AuditEmitter>,
}

impl std::fmt::Debug for RoleAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleAdmin").field("cache", &self.cache).finish()
    }
}

impl RoleAdmin {
    pub fn new(
        store: Arc<dyn RoleAdminStore>,
        cache: Arc<PermissionCache>,
        audit: Arc<AuditEmitter>,
    ) -> Self {
        Self {
            store,
            cache,
            audit,
        }
    }

    /// Create a role, or replace it if the id already exists
    ///
    /// A system role keeps its name, tenant and system flag; only its
    /// description can change.
    pub async fn save_role(&self, actor: &Principal, role: Role) -> Result<Role> {
        let role_id = role.id.clone();
        if let Some(current) = self.store.get_role(&role_id).await? {
            if current.is_system
                && (!role.is_system || role.name != current.name || role.tenant_id != current.tenant_id)
            {
                return Err(GuardError::SystemRole(current.name));
            }
        }
        let holders = self.holders(std::slice::from_ref(&role_id)).await;
        self.store.save_role(role.clone()).await?;
        let invalidated = self.invalidate(holders).await?;

        info!(role_id = %role_id, invalidated, "Saved role");
        self.emit(actor, "save_role", json!({ "role": role }), invalidated);
        Ok(role)
    }

    /// Delete a non-system role and its assignments
    pub async fn delete_role(&self, actor: &Principal, role_id: &str) -> Result<()> {
        let role = self
            .store
            .get_role(role_id)
            .await?
            .ok_or_else(|| GuardError::role_not_found(role_id))?;
        if role.is_system {
            return Err(GuardError::SystemRole(role.name));
        }

        let holders = self.holders(&[role.id.clone()]).await;
        if !self.store.delete_role(role_id).await? {
            return Err(GuardError::role_not_found(role_id));
        }
        let invalidated = self.invalidate(holders).await?;

        info!(role_id, invalidated, "Deleted role");
        self.emit(actor, "delete_role", json!({ "role_id": role_id }), invalidated);
        Ok(())
    }

    /// Create a new permission at version 1
    pub async fn create_permission(&self, actor: &Principal, permission: Permission) -> Result<Permission> {
        if self.store.get_permission(&permission.id).await?.is_some() {
            return Err(GuardError::validation(format!(
                "Permission '{}' already exists",
                permission.id
            )));
        }

        let permission = Permission {
            version: 1,
            ..permission
        };
        self.store.save_permission(permission.clone()).await?;

        info!(permission_id = %permission.id, pattern = %permission.pattern, "Created permission");
        self.emit(
            actor,
            "create_permission",
            json!({ "permission_id": permission.id, "pattern": permission.pattern.to_string() }),
            0,
        );
        Ok(permission)
    }

    /// Replace a permission with a new version
    pub async fn update_permission(
        &self,
        actor: &Principal,
        permission_id: &str,
        update: PermissionUpdate,
    ) -> Result<Permission> {
        let current = self
            .store
            .get_permission(permission_id)
            .await?
            .ok_or_else(|| GuardError::permission_not_found(permission_id))?;

        let next = Permission {
            id: current.id.clone(),
            name: update.name.unwrap_or(current.name),
            pattern: update.pattern.unwrap_or(current.pattern),
            priority: update.priority.unwrap_or(current.priority),
            version: current.version + 1,
        };

        let roles = self.roles_granting(permission_id).await;
        let holders = match &roles {
            Some(roles) => self.holders(roles).await,
            None => None,
        };
        self.store.save_permission(next.clone()).await?;
        let invalidated = self.invalidate(holders).await?;

        info!(
            permission_id,
            version = next.version,
            invalidated,
            "Updated permission"
        );
        self.emit(
            actor,
            "update_permission",
            json!({
                "permission_id": permission_id,
                "pattern": next.pattern.to_string(),
                "priority": next.priority,
                "version": next.version,
            }),
            invalidated,
        );
        Ok(next)
    }

    /// Delete a permission and its grants
    pub async fn delete_permission(&self, actor: &Principal, permission_id: &str) -> Result<()> {
        let roles = self.roles_granting(permission_id).await;
        let holders = match &roles {
            Some(roles) => self.holders(roles).await,
            None => None,
        };
        if !self.store.delete_permission(permission_id).await? {
            return Err(GuardError::permission_not_found(permission_id));
        }
        let invalidated = self.invalidate(holders).await?;

        info!(permission_id, invalidated, "Deleted permission");
        self.emit(
            actor,
            "delete_permission",
            json!({ "permission_id": permission_id }),
            invalidated,
        );
        Ok(())
    }

    /// Grant a permission to a role; every holder of the role is invalidated
    pub async fn grant_permission(&self, actor: &Principal, role_id: &str, permission_id: &str) -> Result<()> {
        self.store.grant_permission(role_id, permission_id).await?;
        let holders = self.holders(&[role_id.to_string()]).await;
        let invalidated = self.invalidate(holders).await?;

        info!(role_id, permission_id, invalidated, "Granted permission");
        self.emit(
            actor,
            "grant_permission",
            json!({ "role_id": role_id, "permission_id": permission_id }),
            invalidated,
        );
        Ok(())
    }

    /// Revoke a permission from a role; returns false if it was not granted
    ///
    /// Fails with `RoleNotFound` or `PermissionNotFound` for unknown ids.
    pub async fn revoke_permission(&self, actor: &Principal, role_id: &str, permission_id: &str) -> Result<bool> {
        let revoked = self.store.revoke_permission(role_id, permission_id).await?;
        if !revoked {
            return Ok(false);
        }
        let holders = self.holders(&[role_id.to_string()]).await;
        let invalidated = self.invalidate(holders).await?;

        info!(role_id, permission_id, invalidated, "Revoked permission");
        self.emit(
            actor,
            "revoke_permission",
            json!({ "role_id": role_id, "permission_id": permission_id }),
            invalidated,
        );
        Ok(true)
    }

    pub async fn assign_user(&self, actor: &Principal, user_id: &str, role_id: &str) -> Result<()> {
        self.store.assign_user(user_id, role_id).await?;
        let invalidated = self.cache.invalidate_user(user_id).await?;

        info!(user_id, role_id, "Assigned role");
        self.emit(
            actor,
            "assign_user",
            json!({ "user_id": user_id, "role_id": role_id }),
            invalidated,
        );
        Ok(())
    }

    /// Returns false if the user did not hold the role; an unknown role is `RoleNotFound`
    pub async fn unassign_user(&self, actor: &Principal, user_id: &str, role_id: &str) -> Result<bool> {
        if !self.store.unassign_user(user_id, role_id).await? {
            return Ok(false);
        }
        let invalidated = self.cache.invalidate_user(user_id).await?;

        info!(user_id, role_id, "Unassigned role");
        self.emit(
            actor,
            "unassign_user",
            json!({ "user_id": user_id, "role_id": role_id }),
            invalidated,
        );
        Ok(true)
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>> {
        self.store.list_roles().await
    }

    async fn roles_granting(&self, permission_id: &str) -> Option<Vec<RoleId>> {
        match self.store.get_roles_with_permission(permission_id).await {
            Ok(roles) => Some(roles),
            Err(e) => {
                warn!(permission_id, error = %e, "Cannot enumerate roles granting permission");
                None
            }
        }
    }

    /// Users holding any of `role_ids`, or `None` if they cannot be enumerated
    async fn holders(&self, role_ids: &[RoleId]) -> Option<BTreeSet<UserId>> {
        let mut users = BTreeSet::new();
        for role_id in role_ids {
            match self.store.get_users_for_role(role_id).await {
                Ok(holders) => users.extend(holders),
                Err(e) => {
                    warn!(role_id = %role_id, error = %e, "Cannot enumerate role holders");
                    return None;
                }
            }
        }
        Some(users)
    }

    async fn invalidate(&self, holders: Option<BTreeSet<UserId>>) -> Result<usize> {
        match holders {
            Some(users) => self.cache.invalidate_users(&users).await,
            None => {
                warn!("Invalidating every cached context");
                self.cache.invalidate_all().await
            }
        }
    }

    fn emit(&self, actor: &Principal, operation: &str, mut input: Value, invalidated: usize) {
        if let Value::Object(map) = &mut input {
            map.insert("operation".to_string(), json!(operation));
        }
        self.audit.emit(AuditEvent::new(
            AuditEventType::RoleMutated,
            &actor.user_id,
            &actor.tenant_id,
            input,
            json!({ "applied": true, "invalidated_contexts": invalidated }),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::rbac::store::{MemoryRoleStore, RoleStore};
    use crate::config::PermissionCacheConfig;
    use crate::core::cache_manager::MemoryCacheBackend;
    use crate::auth::rbac::types::UserContext;
    use async_trait::async_trait;

    mockall::mock! {
        AdminStore {}

        #[async_trait]
        impl RoleStore for AdminStore {
            async fn get_roles_for_user(&self, user_id: &str, tenant_id: &str) -> Result<Vec<Role>>;
            async fn get_permissions_for_role(&self, role_id: &str) -> Result<Vec<Permission>>;
        }

        #[async_trait]
        impl RoleAdminStore for AdminStore {
            async fn get_role(&self, role_id: &str) -> Result<Option<Role>>;
            async fn get_permission(&self, permission_id: &str) -> Result<Option<Permission>>;
            async fn list_roles(&self) -> Result<Vec<Role>>;
            async fn get_users_for_role(&self, role_id: &str) -> Result<Vec<UserId>>;
            async fn get_roles_with_permission(&self, permission_id: &str) -> Result<Vec<RoleId>>;
            async fn save_role(&self, role: Role) -> Result<()>;
            async fn delete_role(&self, role_id: &str) -> Result<bool>;
            async fn save_permission(&self, permission: Permission) -> Result<()>;
            async fn delete_permission(&self, permission_id: &str) -> Result<bool>;
            async fn grant_permission(&self, role_id: &str, permission_id: &str) -> Result<()>;
            async fn revoke_permission(&self, role_id: &str, permission_id: &str) -> Result<bool>;
            async fn assign_user(&self, user_id: &str, role_id: &str) -> Result<()>;
            async fn unassign_user(&self, user_id: &str, role_id: &str) -> Result<bool>;
        }
    }

    fn cache() -> Arc<PermissionCache> {
        Arc::new(PermissionCache::new(
            Arc::new(MemoryCacheBackend::new()),
            "test",
            PermissionCacheConfig::default(),
        ))
    }

    fn actor() -> Principal {
        Principal::new("admin", "t1")
    }

    async fn warm(cache: &PermissionCache, user: &str) {
        let context = UserContext::empty(&Principal::new(user, "t1"));
        cache.put_context(&context, cache.epoch()).await.unwrap();
    }

    #[tokio::test]
    async fn test_system_role_cannot_be_deleted() {
        let store = Arc::new(MemoryRoleStore::with_defaults("super_admin").unwrap());
        let admin = RoleAdmin::new(store, cache(), Arc::new(AuditEmitter::disabled()));

        let err = admin.delete_role(&actor(), "super_admin").await.unwrap_err();
        assert!(matches!(err, GuardError::SystemRole(_)));

        let err = admin.delete_role(&actor(), "missing").await.unwrap_err();
        assert!(matches!(err, GuardError::RoleNotFound(_)));
    }

    #[tokio::test]
    async fn test_system_role_cannot_be_redefined() {
        let store = Arc::new(MemoryRoleStore::with_defaults("super_admin").unwrap());
        let admin = RoleAdmin::new(store.clone(), cache(), Arc::new(AuditEmitter::disabled()));

        let err = admin
            .save_role(&actor(), Role::global("super_admin", "super_admin"))
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::SystemRole(_)));

        let mut moved = store.get_role("super_admin").await.unwrap().unwrap();
        moved.tenant_id = Some("t1".to_string());
        let err = admin.save_role(&actor(), moved).await.unwrap_err();
        assert!(matches!(err, GuardError::SystemRole(_)));

        let mut described = store.get_role("super_admin").await.unwrap().unwrap();
        described.description = "Platform operators".to_string();
        admin.save_role(&actor(), described).await.unwrap();

        let stored = store.get_role("super_admin").await.unwrap().unwrap();
        assert!(stored.is_system);
        assert_eq!(stored.description, "Platform operators");
    }

    #[tokio::test]
    async fn test_unknown_ids_are_reported_on_removal() {
        let store = Arc::new(MemoryRoleStore::with_defaults("super_admin").unwrap());
        store.seed_tenant_roles("t1");
        let admin = RoleAdmin::new(store, cache(), Arc::new(AuditEmitter::disabled()));

        let err = admin.revoke_permission(&actor(), "t1:viewer", "missing").await.unwrap_err();
        assert!(matches!(err, GuardError::PermissionNotFound(_)));
        let err = admin.revoke_permission(&actor(), "missing", "perm.read.tenant").await.unwrap_err();
        assert!(matches!(err, GuardError::RoleNotFound(_)));
        let err = admin.unassign_user(&actor(), "u1", "missing").await.unwrap_err();
        assert!(matches!(err, GuardError::RoleNotFound(_)));

        assert!(!admin.unassign_user(&actor(), "u1", "t1:viewer").await.unwrap());
    }

    #[tokio::test]
    async fn test_grant_invalidates_only_role_holders() {
        let store = Arc::new(MemoryRoleStore::new());
        store.insert_role(Role::for_tenant("t1:editors", "editors", "t1"));
        store.insert_permission(Permission::new("p1", "edit jobs", "jobs.write.tenant".parse().unwrap()));
        store.assign("u1", "t1:editors");

        let cache = cache();
        warm(&cache, "u1").await;
        warm(&cache, "u2").await;

        let admin = RoleAdmin::new(store, cache.clone(), Arc::new(AuditEmitter::disabled()));
        admin.grant_permission(&actor(), "t1:editors", "p1").await.unwrap();

        assert!(cache.get_context(&Principal::new("u1", "t1")).await.is_none());
        assert!(cache.get_context(&Principal::new("u2", "t1")).await.is_some());
    }

    #[tokio::test]
    async fn test_update_permission_bumps_version() {
        let store = Arc::new(MemoryRoleStore::with_defaults("super_admin").unwrap());
        let admin = RoleAdmin::new(store.clone(), cache(), Arc::new(AuditEmitter::disabled()));

        let update = PermissionUpdate {
            priority: Some(10),
            ..PermissionUpdate::default()
        };
        let updated = admin
            .update_permission(&actor(), "perm.read.global", update)
            .await
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.priority, 10);
        assert_eq!(updated.pattern.to_string(), "*.read.global");

        let err = admin
            .update_permission(&actor(), "missing", PermissionUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::PermissionNotFound(_)));
    }

    #[tokio::test]
    async fn test_unenumerable_holders_fall_back_to_full_invalidation() {
        let mut store = MockAdminStore::new();
        store.expect_grant_permission().returning(|_, _| Ok(()));
        store
            .expect_get_users_for_role()
            .returning(|_| Err(GuardError::store("replica down")));

        let cache = cache();
        warm(&cache, "u1").await;
        warm(&cache, "u2").await;

        let admin = RoleAdmin::new(Arc::new(store), cache.clone(), Arc::new(AuditEmitter::disabled()));
        admin.grant_permission(&actor(), "r1", "p1").await.unwrap();

        assert!(cache.get_context(&Principal::new("u1", "t1")).await.is_none());
        assert!(cache.get_context(&Principal::new("u2", "t1")).await.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_skips_invalidation() {
        let mut store = MockAdminStore::new();
        store
            .expect_assign_user()
            .returning(|_, _| Err(GuardError::store("write failed")));

        let cache = cache();
        warm(&cache, "u1").await;

        let admin = RoleAdmin::new(Arc::new(store), cache.clone(), Arc::new(AuditEmitter::disabled()));
        assert!(admin.assign_user(&actor(), "u1", "r1").await.is_err());
        assert!(cache.get_context(&Principal::new("u1", "t1")).await.is_some());
    }

    #[tokio::test]
    async fn test_mutations_are_audited() {
        let sink = crate::audit::MemoryAuditSink::new();
        let audit = Arc::new(AuditEmitter::new(
            crate::config::AuditConfig::default(),
            Arc::new(sink.clone()),
        ));
        let store = Arc::new(MemoryRoleStore::with_defaults("super_admin").unwrap());
        store.seed_tenant_roles("t1");
        let admin = RoleAdmin::new(store, cache(), audit.clone());

        admin.assign_user(&actor(), "u1", "t1:viewer").await.unwrap();
        assert!(admin.unassign_user(&actor(), "u1", "t1:viewer").await.unwrap());
        assert!(!admin.unassign_user(&actor(), "u1", "t1:viewer").await.unwrap());
        audit.flush().await;

        let events = sink.events_of(AuditEventType::RoleMutated);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].input["operation"], "assign_user");
        assert_eq!(events[1].input["operation"], "unassign_user");
        assert_eq!(events[0].actor_id, "admin");
    }
}
