//! Authorization module
//!
//! Permission patterns, user context resolution, caching and access decisions.

pub mod rbac;

pub use rbac::{
    AccessDecision, AccessDecisionEngine, AccessRequest, ContextResolver, DecisionReason,
    MemoryRoleStore, Permission, PermissionCache, PermissionPattern, PermissionService,
    PermissionUpdate, PolicySeed, Principal, ResourceTarget, Role, RoleAdmin, RoleAdminStore,
    RoleStore, Scope, Segment, UserContext,
};
