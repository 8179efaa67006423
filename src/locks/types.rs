//! Lock data model

use crate::auth::rbac::{AccessDecision, TenantId, UserId};
use crate::utils::error::{GuardError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite key of an entity lock
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LockKey {
    pub tenant_id: TenantId,
    pub entity_type: String,
    pub entity_id: String,
}

impl LockKey {
    pub fn new(
        tenant_id: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
        }
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tenant_id, self.entity_type, self.entity_id)
    }
}

/// Advisory lock record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityLock {
    #[serde(flatten)]
    pub key: LockKey,
    pub locked_by: UserId,
    pub reason: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Active lock as reported to callers
pub type LockInfo = EntityLock;

impl EntityLock {
    pub fn new(
        key: LockKey,
        locked_by: impl Into<String>,
        reason: impl Into<String>,
        acquired_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            locked_by: locked_by.into(),
            reason: reason.into(),
            acquired_at,
            expires_at,
            is_active: true,
        }
    }

    /// Active and not yet expired at `now`
    pub fn is_held_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.locked_by == user_id
    }
}

/// How [`LockStore::upsert_lock`](super::LockStore::upsert_lock) may write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertMode {
    /// Create only if no lock is held for the key
    CreateIfVacant,
    /// Replace only if the held lock belongs to the same user
    RenewIfOwner,
}

/// How [`LockStore::delete_lock`](super::LockStore::delete_lock) may delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteMode {
    /// Delete only if the held lock belongs to this user
    Owner(UserId),
    /// Delete whoever holds it
    Force,
}

/// Result of a conditional store write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    /// The write happened; carries the written or removed record
    Applied(EntityLock),
    /// Blocked by a lock held by someone else
    Held(EntityLock),
    /// No held lock for the key
    Missing,
}

/// Outcome of a coordinator operation
///
/// Denials are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOutcome {
    Acquired(EntityLock),
    Renewed(EntityLock),
    Released(EntityLock),
    ForceReleased {
        lock: EntityLock,
        forced_by: UserId,
    },
    /// Another user holds the lock
    Conflict(EntityLock),
    /// The caller is not the holder
    OwnershipViolation(EntityLock),
    NotFound(LockKey),
    /// Force-release refused by the access decision
    Denied {
        key: LockKey,
        decision: AccessDecision,
    },
}

impl LockOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Acquired(_) | Self::Renewed(_) | Self::Released(_) | Self::ForceReleased { .. }
        )
    }

    /// Lock record the outcome refers to, if any
    pub fn lock(&self) -> Option<&EntityLock> {
        match self {
            Self::Acquired(lock)
            | Self::Renewed(lock)
            | Self::Released(lock)
            | Self::Conflict(lock)
            | Self::OwnershipViolation(lock)
            | Self::ForceReleased { lock, .. } => Some(lock),
            Self::NotFound(_) | Self::Denied { .. } => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acquired(_) => "acquired",
            Self::Renewed(_) => "renewed",
            Self::Released(_) => "released",
            Self::ForceReleased { .. } => "force_released",
            Self::Conflict(_) => "conflict",
            Self::OwnershipViolation(_) => "ownership_violation",
            Self::NotFound(_) => "not_found",
            Self::Denied { .. } => "denied",
        }
    }

    /// Convert failures into the matching [`GuardError`]
    pub fn into_result(self) -> Result<EntityLock> {
        match self {
            Self::Acquired(lock)
            | Self::Renewed(lock)
            | Self::Released(lock)
            | Self::ForceReleased { lock, .. } => Ok(lock),
            Self::Conflict(lock) => Err(GuardError::LockConflict {
                key: lock.key.to_string(),
                holder: lock.locked_by,
            }),
            Self::OwnershipViolation(lock) => Err(GuardError::LockOwnershipViolation {
                key: lock.key.to_string(),
                holder: lock.locked_by,
            }),
            Self::NotFound(key) => Err(GuardError::LockNotFound(key.to_string())),
            Self::Denied { key, decision } => Err(GuardError::LockDenied(format!(
                "{} ({})",
                key, decision.reason
            ))),
        }
    }
}

impl fmt::Display for LockOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
