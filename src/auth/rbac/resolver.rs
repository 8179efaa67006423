//! Context resolver
//!
//! Builds a [`UserContext`] from an authenticated principal by reading the
//! user's roles and their permissions from the [`RoleStore`].

use super::store::RoleStore;
use super::types::{Principal, Role, UserContext};
use crate::utils::error::{GuardError, Result};
use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves user contexts from the role store
#[derive(Clone)]
pub struct ContextResolver {
    store: Arc<dyn RoleStore>,
    super_admin_role: String,
}

impl std::fmt::Debug for ContextResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextResolver")
            .field("super_admin_role", &self.super_admin_role)
            .finish()
    }
}

impl ContextResolver {
    pub fn new(store: Arc<dyn RoleStore>, super_admin_role: impl Into<String>) -> Self {
        Self {
            store,
            super_admin_role: super_admin_role.into(),
        }
    }

    /// Build the context for `principal`
    ///
    /// Any store failure is reported as [`GuardError::ContextUnavailable`];
    /// callers must treat it as a denial.
    pub async fn resolve(&self, principal: &Principal) -> Result<UserContext> {
        let roles = self
            .store
            .get_roles_for_user(&principal.user_id, &principal.tenant_id)
            .await
            .map_err(|e| unavailable(principal, e))?;

        // the store is expected to scope roles already
        let roles: Vec<Role> = roles
            .into_iter()
            .filter(|role| role.applies_to_tenant(&principal.tenant_id))
            .collect();

        let permission_sets = try_join_all(
            roles
                .iter()
                .map(|role| self.store.get_permissions_for_role(&role.id)),
        )
        .await
        .map_err(|e| unavailable(principal, e))?;

        let mut context = UserContext::empty(principal);
        for role in &roles {
            if self.is_super_admin_role(role) {
                context.is_super_admin = true;
            }
            context.role_names.insert(role.name.clone());
        }
        context.permissions = permission_sets.into_iter().flatten().collect::<HashSet<_>>();

        debug!(
            user_id = %principal.user_id,
            tenant_id = %principal.tenant_id,
            roles = context.role_names.len(),
            permissions = context.permissions.len(),
            super_admin = context.is_super_admin,
            "Resolved user context"
        );
        Ok(context)
    }

    /// Only a platform-global role with the reserved name grants the bypass
    fn is_super_admin_role(&self, role: &Role) -> bool {
        role.is_global() && role.name == self.super_admin_role
    }

    pub fn super_admin_role(&self) -> &str {
        &self.super_admin_role
    }
}

fn unavailable(principal: &Principal, err: GuardError) -> GuardError {
    warn!(
        user_id = %principal.user_id,
        tenant_id = %principal.tenant_id,
        error = %err,
        "Failed to resolve user context"
    );
    GuardError::context_unavailable(format!(
        "user {} in tenant {}: {}",
        principal.user_id, principal.tenant_id, err
    ))
}
