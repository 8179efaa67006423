//! Audit event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of audited operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    AccessDecision,
    SuperAdminBypass,
    LockAcquired,
    LockRenewed,
    LockReleased,
    LockForceReleased,
    LockRejected,
    RoleMutated,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessDecision => "access_decision",
            Self::SuperAdminBypass => "super_admin_bypass",
            Self::LockAcquired => "lock_acquired",
            Self::LockRenewed => "lock_renewed",
            Self::LockReleased => "lock_released",
            Self::LockForceReleased => "lock_force_released",
            Self::LockRejected => "lock_rejected",
            Self::RoleMutated => "role_mutated",
        }
    }
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub event_type: AuditEventType,
    pub actor_id: String,
    pub tenant_id: String,
    /// Full input of the audited operation
    pub input: serde_json::Value,
    /// Outcome of the audited operation
    pub decision: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        event_type: AuditEventType,
        actor_id: impl Into<String>,
        tenant_id: impl Into<String>,
        input: serde_json::Value,
        decision: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            actor_id: actor_id.into(),
            tenant_id: tenant_id.into(),
            input,
            decision,
            timestamp: Utc::now(),
        }
    }
}
