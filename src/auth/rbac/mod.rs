//! Role-based access control
//!
//! Pattern model, store adapter, context resolution, caching and access
//! decisions for multi-tenant permission checks.

mod admin;
mod cache;
mod decision;
mod engine;
mod pattern;
mod resolver;
mod seed;
mod service;
mod store;
mod types;

pub use admin::{PermissionUpdate, RoleAdmin};
pub use cache::{DecisionKey, PermissionCache};
pub use decision::{AccessDecision, AccessRequest, DecisionReason, ResourceTarget};
pub use engine::{AccessDecisionEngine, best_match};
pub use pattern::{PermissionPattern, Scope, Segment};
pub use resolver::ContextResolver;
pub use seed::{AssignmentSeed, GrantSeed, PolicySeed};
pub use service::PermissionService;
pub use store::{MemoryRoleStore, RoleAdminStore, RoleStore};
pub use types::{
    AccountId, Permission, PermissionId, Principal, Role, RoleId, TenantId, UserContext, UserId,
};
