//! Access requests and decisions

use super::pattern::Scope;
use super::types::{AccountId, Permission, TenantId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the requested resource lives
///
/// Unknown parts are assumed to lie within the requester's own tenant,
/// account and ownership. Known parts must match for a non-global grant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceTarget {
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    #[serde(default)]
    pub account_id: Option<AccountId>,
    #[serde(default)]
    pub owner_id: Option<UserId>,
}

impl ResourceTarget {
    pub fn tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            ..Self::default()
        }
    }

    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }
}

/// Requested `(action, resource, scope, resourceId?)` tuple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessRequest {
    pub action: String,
    pub resource: String,
    pub scope: Scope,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub target: ResourceTarget,
    #[serde(default)]
    pub allow_read_only_fallback: bool,
}

impl AccessRequest {
    pub fn new(action: impl Into<String>, resource: impl Into<String>, scope: Scope) -> Self {
        Self {
            action: action.into(),
            resource: resource.into(),
            scope,
            resource_id: None,
            target: ResourceTarget::default(),
            allow_read_only_fallback: false,
        }
    }

    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_target(mut self, target: ResourceTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_read_only_fallback(mut self) -> Self {
        self.allow_read_only_fallback = true;
        self
    }
}

impl fmt::Display for AccessRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.resource, self.action, self.scope)?;
        if let Some(id) = &self.resource_id {
            write!(f, "#{}", id)?;
        }
        Ok(())
    }
}

/// Why a decision came out the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionReason {
    Matched,
    SuperAdminBypass,
    ReadOnlyFallback,
    NoMatch,
    ContextMissing,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "MATCHED",
            Self::SuperAdminBypass => "SUPER_ADMIN_BYPASS",
            Self::ReadOnlyFallback => "READ_ONLY_FALLBACK",
            Self::NoMatch => "NO_MATCH",
            Self::ContextMissing => "CONTEXT_MISSING",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an access check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: DecisionReason,
    pub matched_permission: Option<Permission>,
}

impl AccessDecision {
    pub fn matched(permission: Permission) -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::Matched,
            matched_permission: Some(permission),
        }
    }

    pub fn read_only_fallback(permission: Permission) -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::ReadOnlyFallback,
            matched_permission: Some(permission),
        }
    }

    pub fn super_admin() -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::SuperAdminBypass,
            matched_permission: None,
        }
    }

    pub fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
            matched_permission: None,
        }
    }

    pub fn context_missing() -> Self {
        Self::deny(DecisionReason::ContextMissing)
    }

    pub fn no_match() -> Self {
        Self::deny(DecisionReason::NoMatch)
    }
}
