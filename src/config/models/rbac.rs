//! Permission resolution configuration

use super::*;
use serde::{Deserialize, Serialize};

/// RBAC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RbacConfig {
    /// Reserved name of the platform-global super-admin role
    #[serde(default = "default_super_admin_role")]
    pub super_admin_role: String,
    /// Actions that may fall back to a `read` grant
    #[serde(default = "default_read_actions")]
    pub read_actions: Vec<String>,
    /// Pattern checked before a lock is force-released
    #[serde(default = "default_force_release_permission")]
    pub force_release_permission: String,
    /// Seed the built-in system roles into the in-memory store
    #[serde(default = "default_true")]
    pub seed_default_roles: bool,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            super_admin_role: default_super_admin_role(),
            read_actions: default_read_actions(),
            force_release_permission: default_force_release_permission(),
            seed_default_roles: true,
        }
    }
}

impl RbacConfig {
    /// Merge RBAC configurations
    pub fn merge(mut self, other: Self) -> Self {
        if other.super_admin_role != default_super_admin_role() {
            self.super_admin_role = other.super_admin_role;
        }
        if other.read_actions != default_read_actions() {
            self.read_actions = other.read_actions;
        }
        if other.force_release_permission != default_force_release_permission() {
            self.force_release_permission = other.force_release_permission;
        }
        if !other.seed_default_roles {
            self.seed_default_roles = false;
        }
        self
    }

    /// Whether `action` is classified as a read
    pub fn is_read_action(&self, action: &str) -> bool {
        self.read_actions.iter().any(|a| a == action)
    }
}
