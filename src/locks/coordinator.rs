//! Lock coordinator
//!
//! State machine per key: unlocked -> locked (acquire), locked -> locked
//! (renew), locked -> unlocked (release, force-release, expiry). Expiry is
//! lazy; the store treats an expired record as vacant.

use super::clock::{Clock, SystemClock};
use super::store::LockStore;
use super::types::{DeleteMode, EntityLock, LockInfo, LockKey, LockOutcome, StoreWrite, UpsertMode};
use crate::audit::{AuditEmitter, AuditEvent, AuditEventType};
use crate::auth::rbac::{AccessRequest, PermissionPattern, PermissionService, Principal, ResourceTarget, Scope, Segment};
use crate::config::LockConfig;
use crate::utils::error::{GuardError, Result};
use chrono::Duration;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Coordinates advisory entity locks
#[derive(Clone)]
pub struct LockCoordinator {
    store: Arc<dyn LockStore>,
    permissions: PermissionService,
    audit: Arc<AuditEmitter>,
    clock: Arc<dyn Clock>,
    config: LockConfig,
    force_release: PermissionPattern,
}

impl std::fmt::Debug for LockCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockCoordinator")
            .field("store", &self.store.name())
            .field("config", &self.config)
            .field("force_release", &self.force_release.to_string())
            .finish()
    }
}

impl LockCoordinator {
    pub fn new(
        store: Arc<dyn LockStore>,
        permissions: PermissionService,
        audit: Arc<AuditEmitter>,
        config: LockConfig,
    ) -> Self {
        Self {
            store,
            permissions,
            audit,
            clock: Arc::new(SystemClock),
            config,
            force_release: PermissionPattern::new(
                Segment::Exact("locks".to_string()),
                Segment::Exact("force_release".to_string()),
                Scope::Tenant,
            ),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Permission checked before a force-release
    pub fn with_force_release_permission(mut self, pattern: PermissionPattern) -> Self {
        self.force_release = pattern;
        self
    }

    /// Acquire the lock for `key` if nobody holds it
    ///
    /// `ttl_minutes` defaults to the configured TTL. An existing, unexpired
    /// lock is never overwritten, whoever holds it.
    pub async fn acquire_lock(
        &self,
        key: &LockKey,
        locked_by: &str,
        reason: &str,
        ttl_minutes: Option<u64>,
    ) -> Result<LockOutcome> {
        let ttl = self.ttl(ttl_minutes)?;
        let now = self.clock.now();
        let lock = EntityLock::new(key.clone(), locked_by, reason, now, now + ttl);

        let outcome = match self
            .store
            .upsert_lock(lock, UpsertMode::CreateIfVacant, now)
            .await?
        {
            StoreWrite::Applied(lock) => {
                info!(key = %key, locked_by, expires_at = %lock.expires_at, "Lock acquired");
                LockOutcome::Acquired(lock)
            }
            StoreWrite::Held(existing) => {
                debug!(key = %key, locked_by, holder = %existing.locked_by, "Lock conflict");
                LockOutcome::Conflict(existing)
            }
            StoreWrite::Missing => {
                return Err(GuardError::store(format!(
                    "lock store reported no record after create on {}",
                    key
                )));
            }
        };

        self.emit(
            &outcome,
            locked_by,
            key,
            json!({
                "operation": "acquire",
                "reason": reason,
                "ttl_minutes": ttl.num_minutes(),
            }),
        );
        Ok(outcome)
    }

    /// Active lock for `key`, if any
    pub async fn is_locked(&self, key: &LockKey) -> Result<Option<LockInfo>> {
        self.store.find_active_lock(key, self.clock.now()).await
    }

    /// Extend the holder's lock by `ttl_minutes` from now
    pub async fn renew_lock(
        &self,
        key: &LockKey,
        requested_by: &str,
        ttl_minutes: Option<u64>,
    ) -> Result<LockOutcome> {
        let ttl = self.ttl(ttl_minutes)?;
        let now = self.clock.now();

        let outcome = match self.store.find_active_lock(key, now).await? {
            None => LockOutcome::NotFound(key.clone()),
            Some(current) if !current.is_owned_by(requested_by) => {
                LockOutcome::OwnershipViolation(current)
            }
            Some(current) => {
                let renewed = EntityLock {
                    expires_at: now + ttl,
                    ..current
                };
                match self
                    .store
                    .upsert_lock(renewed, UpsertMode::RenewIfOwner, now)
                    .await?
                {
                    StoreWrite::Applied(lock) => {
                        info!(key = %key, requested_by, expires_at = %lock.expires_at, "Lock renewed");
                        LockOutcome::Renewed(lock)
                    }
                    StoreWrite::Held(other) => LockOutcome::OwnershipViolation(other),
                    StoreWrite::Missing => LockOutcome::NotFound(key.clone()),
                }
            }
        };

        self.emit(
            &outcome,
            requested_by,
            key,
            json!({ "operation": "renew", "ttl_minutes": ttl.num_minutes() }),
        );
        Ok(outcome)
    }

    /// Release a lock held by `requested_by`
    ///
    /// A lock held by someone else is left untouched and reported as an
    /// ownership violation, distinct from a missing lock.
    pub async fn release_lock(&self, key: &LockKey, requested_by: &str) -> Result<LockOutcome> {
        let now = self.clock.now();
        let outcome = match self
            .store
            .delete_lock(key, DeleteMode::Owner(requested_by.to_string()), now)
            .await?
        {
            StoreWrite::Applied(lock) => {
                info!(key = %key, requested_by, "Lock released");
                LockOutcome::Released(lock)
            }
            StoreWrite::Held(lock) => {
                warn!(key = %key, requested_by, holder = %lock.locked_by, "Release by non-owner refused");
                LockOutcome::OwnershipViolation(lock)
            }
            StoreWrite::Missing => LockOutcome::NotFound(key.clone()),
        };

        self.emit(&outcome, requested_by, key, json!({ "operation": "release" }));
        Ok(outcome)
    }

    /// Release a lock regardless of its holder
    ///
    /// The caller needs the force-release permission within the lock's tenant
    /// (or the super-admin bypass). Refusal is a [`LockOutcome::Denied`].
    pub async fn force_release_lock(&self, key: &LockKey, forced_by: &str) -> Result<LockOutcome> {
        let request = self.force_release_request(key);
        let principal = Principal::new(forced_by, key.tenant_id.clone());
        let decision = self.permissions.check(&principal, &request).await;

        let outcome = if !decision.allowed {
            warn!(key = %key, forced_by, reason = %decision.reason, "Force release denied");
            LockOutcome::Denied {
                key: key.clone(),
                decision,
            }
        } else {
            let now = self.clock.now();
            match self.store.delete_lock(key, DeleteMode::Force, now).await? {
                StoreWrite::Applied(lock) => {
                    info!(key = %key, forced_by, holder = %lock.locked_by, "Lock force-released");
                    LockOutcome::ForceReleased {
                        lock,
                        forced_by: forced_by.to_string(),
                    }
                }
                StoreWrite::Held(lock) => {
                    return Err(GuardError::store(format!(
                        "lock store refused forced delete of {} held by {}",
                        key, lock.locked_by
                    )));
                }
                StoreWrite::Missing => LockOutcome::NotFound(key.clone()),
            }
        };

        self.emit(&outcome, forced_by, key, json!({ "operation": "force_release" }));
        Ok(outcome)
    }

    /// Active locks of a tenant
    pub async fn list_locks(&self, tenant_id: &str) -> Result<Vec<LockInfo>> {
        self.store.list_active(tenant_id, self.clock.now()).await
    }

    /// Remove expired lock records
    pub async fn purge_expired(&self) -> Result<usize> {
        self.store.purge_expired(self.clock.now()).await
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    fn ttl(&self, ttl_minutes: Option<u64>) -> Result<Duration> {
        let minutes = ttl_minutes.unwrap_or(self.config.default_ttl_minutes);
        if minutes == 0 {
            return Err(GuardError::validation("Lock TTL must be at least one minute"));
        }
        if minutes > self.config.max_ttl_minutes {
            return Err(GuardError::validation(format!(
                "Lock TTL of {} minutes exceeds the maximum of {}",
                minutes, self.config.max_ttl_minutes
            )));
        }
        let minutes = i64::try_from(minutes)
            .map_err(|_| GuardError::validation("Lock TTL out of range"))?;
        Ok(Duration::minutes(minutes))
    }

    fn force_release_request(&self, key: &LockKey) -> AccessRequest {
        AccessRequest::new(
            self.force_release.action.to_string(),
            self.force_release.resource.to_string(),
            self.force_release.scope,
        )
        .with_resource_id(key.to_string())
        .with_target(ResourceTarget::tenant(key.tenant_id.clone()))
    }

    fn emit(&self, outcome: &LockOutcome, actor_id: &str, key: &LockKey, mut input: Value) {
        let event_type = match outcome {
            LockOutcome::Acquired(_) => AuditEventType::LockAcquired,
            LockOutcome::Renewed(_) => AuditEventType::LockRenewed,
            LockOutcome::Released(_) => AuditEventType::LockReleased,
            LockOutcome::ForceReleased { .. } => AuditEventType::LockForceReleased,
            _ => AuditEventType::LockRejected,
        };

        if let Value::Object(map) = &mut input {
            map.insert("tenant_id".to_string(), json!(key.tenant_id));
            map.insert("entity_type".to_string(), json!(key.entity_type));
            map.insert("entity_id".to_string(), json!(key.entity_id));
        }

        let mut decision = json!({
            "outcome": outcome.as_str(),
            "success": outcome.is_success(),
        });
        if let Value::Object(map) = &mut decision {
            if let Some(lock) = outcome.lock() {
                map.insert("holder".to_string(), json!(lock.locked_by));
                map.insert("expires_at".to_string(), json!(lock.expires_at));
            }
            match outcome {
                LockOutcome::ForceReleased { lock, forced_by } => {
                    map.insert("original_owner".to_string(), json!(lock.locked_by));
                    map.insert("forced_by".to_string(), json!(forced_by));
                }
                LockOutcome::Denied { decision: access, .. } => {
                    map.insert("access_reason".to_string(), json!(access.reason));
                }
                _ => {}
            }
        }

        self.audit.emit(AuditEvent::new(
            event_type,
            actor_id,
            key.tenant_id.clone(),
            input,
            decision,
        ));
    }
}
