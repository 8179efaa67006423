//! Permission resolution validators

use super::trait_def::Validate;
use crate::auth::rbac::PermissionPattern;
use crate::config::models::*;
use tracing::debug;

impl Validate for RbacConfig {
    const SECTION: &'static str = "RBAC";

    fn validate(&self) -> Result<(), String> {
        debug!("Validating RBAC configuration");

        if self.super_admin_role.trim().is_empty() {
            return Err("Super admin role name cannot be empty".to_string());
        }

        if self.read_actions.iter().any(|a| a.is_empty() || a == "*") {
            return Err("Read actions must be concrete, non-empty action names".to_string());
        }

        let pattern = self
            .force_release_permission
            .parse::<PermissionPattern>()
            .map_err(|e| format!("Invalid force release permission: {}", e))?;
        if pattern.is_wildcard() {
            return Err("Force release permission cannot contain wildcards".to_string());
        }

        Ok(())
    }
}
