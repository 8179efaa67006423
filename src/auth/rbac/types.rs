//! RBAC type definitions

use super::pattern::PermissionPattern;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type UserId = String;
pub type TenantId = String;
pub type AccountId = String;
pub type RoleId = String;
pub type PermissionId = String;

/// Permission definition
///
/// Immutable once stored; an update produces a new `version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    /// Stable identifier
    pub id: PermissionId,
    /// Human label
    pub name: String,
    /// Parsed `resource.action.scope` pattern
    pub pattern: PermissionPattern,
    /// Higher wins when several grants match
    #[serde(default)]
    pub priority: i32,
    /// Bumped on every update
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    1
}

impl Permission {
    pub fn new(id: impl Into<String>, name: impl Into<String>, pattern: PermissionPattern) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            pattern,
            priority: 0,
            version: 1,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// True if the resource or action segment is `*`
    pub fn is_wildcard(&self) -> bool {
        self.pattern.is_wildcard()
    }
}

/// Role definition
///
/// Roles are a flat assignment model; there is no inheritance between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable identifier
    pub id: RoleId,
    /// Role name
    pub name: String,
    /// Role description
    #[serde(default)]
    pub description: String,
    /// Owning tenant, `None` for platform-global roles
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    /// System roles cannot be deleted
    #[serde(default)]
    pub is_system: bool,
}

impl Role {
    pub fn global(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            tenant_id: None,
            is_system: false,
        }
    }

    pub fn for_tenant(
        id: impl Into<String>,
        name: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            ..Self::global(id, name)
        }
    }

    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_global(&self) -> bool {
        self.tenant_id.is_none()
    }

    /// Whether the role applies to a principal of `tenant_id`
    pub fn applies_to_tenant(&self, tenant_id: &str) -> bool {
        match &self.tenant_id {
            None => true,
            Some(owner) => owner == tenant_id,
        }
    }
}

/// Authenticated principal handed over by the session layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    #[serde(default)]
    pub account_id: Option<AccountId>,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
            account_id: None,
        }
    }

    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }
}

/// Resolved, cache-only view of what a user may do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub account_id: Option<AccountId>,
    pub role_names: HashSet<String>,
    /// Union of the permissions of every assigned role
    pub permissions: HashSet<Permission>,
    pub is_super_admin: bool,
}

impl UserContext {
    /// Context with no roles and no permissions
    pub fn empty(principal: &Principal) -> Self {
        Self {
            user_id: principal.user_id.clone(),
            tenant_id: principal.tenant_id.clone(),
            account_id: principal.account_id.clone(),
            role_names: HashSet::new(),
            permissions: HashSet::new(),
            is_super_admin: false,
        }
    }

    pub fn has_role(&self, role_name: &str) -> bool {
        self.role_names.contains(role_name)
    }

    /// Patterns held by the user, sorted for display
    pub fn pattern_strings(&self) -> Vec<String> {
        let mut patterns: Vec<String> = self
            .permissions
            .iter()
            .map(|p| p.pattern.to_string())
            .collect();
        patterns.sort();
        patterns.dedup();
        patterns
    }
}
