//! Permission cache
//!
//! Two tiers:
//! - user contexts, keyed by `(user, tenant)`, stored in a [`CacheBackend`]
//!   so several processes can share them;
//! - access decisions, keyed by user and request, held in a process-local
//!   moka cache with a short TTL.
//!
//! Mutations are written to the store first and then invalidate the affected
//! users here. Every invalidation bumps an epoch before deleting entries. A
//! write is checked against the epoch both before and after it lands and is
//! removed again if an invalidation ran in between, so an in-flight read of
//! the old assignments cannot repopulate the cache with stale data.
//!
//! The epoch is per process. With a shared backend, an invalidation in one
//! process does not fence a write racing with it in another; such an entry
//! lives at most `context_ttl_secs`.

use super::decision::{AccessDecision, AccessRequest};
use super::types::{AccountId, Principal, TenantId, UserContext, UserId};
use crate::config::PermissionCacheConfig;
use crate::core::cache_manager::{AtomicCacheStats, CacheStats, escape_key_part};
use crate::core::traits::CacheBackend;
use crate::utils::error::{GuardError, Result};
use moka::future::Cache;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Key of the decision tier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecisionKey {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub account_id: Option<AccountId>,
    pub request: AccessRequest,
}

impl DecisionKey {
    pub fn new(context: &UserContext, request: &AccessRequest) -> Self {
        Self {
            user_id: context.user_id.clone(),
            tenant_id: context.tenant_id.clone(),
            account_id: context.account_id.clone(),
            request: request.clone(),
        }
    }
}

/// Context and decision cache with explicit invalidation
pub struct PermissionCache {
    backend: Arc<dyn CacheBackend>,
    key_prefix: String,
    config: PermissionCacheConfig,
    decisions: Option<Cache<DecisionKey, AccessDecision>>,
    epoch: AtomicU64,
    context_stats: AtomicCacheStats,
    decision_stats: AtomicCacheStats,
}

impl std::fmt::Debug for PermissionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionCache")
            .field("backend", &self.backend.name())
            .field("key_prefix", &self.key_prefix)
            .field("config", &self.config)
            .finish()
    }
}

impl PermissionCache {
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        key_prefix: impl Into<String>,
        config: PermissionCacheConfig,
    ) -> Self {
        let decisions = config.decision_cache_enabled.then(|| {
            Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(config.decision_ttl())
                .support_invalidation_closures()
                .build()
        });

        Self {
            backend,
            key_prefix: key_prefix.into(),
            config,
            decisions,
            epoch: AtomicU64::new(0),
            context_stats: AtomicCacheStats::default(),
            decision_stats: AtomicCacheStats::default(),
        }
    }

    /// Current invalidation epoch
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn bump_epoch(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    fn context_key(&self, user_id: &str, tenant_id: &str) -> String {
        format!(
            "{}:ctx:{}:{}",
            self.key_prefix,
            escape_key_part(user_id),
            escape_key_part(tenant_id)
        )
    }

    fn user_pattern(&self, user_id: &str) -> String {
        format!("{}:ctx:{}:*", self.key_prefix, escape_key_part(user_id))
    }

    /// Cached context for `principal`
    ///
    /// Backend failures are logged and reported as a miss; the caller then
    /// resolves from the store, which stays the source of truth.
    pub async fn get_context(&self, principal: &Principal) -> Option<UserContext> {
        if !self.config.enabled {
            return None;
        }

        let key = self.context_key(&principal.user_id, &principal.tenant_id);
        let bytes = match self.backend.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.context_stats.miss();
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Context cache read failed");
                self.context_stats.miss();
                return None;
            }
        };

        match bincode::deserialize::<UserContext>(&bytes) {
            Ok(context) if context.account_id == principal.account_id => {
                self.context_stats.hit();
                debug!(key = %key, "Context cache hit");
                Some(context)
            }
            Ok(_) => {
                self.context_stats.miss();
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding undecodable context cache entry");
                let _ = self.backend.delete(&key).await;
                self.context_stats.miss();
                None
            }
        }
    }

    /// Store a context resolved while the cache was at `observed_epoch`
    ///
    /// Returns false if an invalidation happened in between and the context
    /// was not stored.
    pub async fn put_context(&self, context: &UserContext, observed_epoch: u64) -> Result<bool> {
        if !self.config.enabled {
            return Ok(false);
        }
        if self.epoch() != observed_epoch {
            debug!(user_id = %context.user_id, "Skipping context write after invalidation");
            return Ok(false);
        }

        let bytes = bincode::serialize(context)
            .map_err(|e| GuardError::cache(format!("Failed to encode user context: {}", e)))?;
        let key = self.context_key(&context.user_id, &context.tenant_id);
        self.backend
            .set(&key, bytes, self.config.context_ttl())
            .await?;

        if self.epoch() != observed_epoch {
            debug!(user_id = %context.user_id, "Dropping context written across an invalidation");
            self.backend.delete(&key).await?;
            return Ok(false);
        }
        Ok(true)
    }

    pub async fn get_decision(&self, key: &DecisionKey) -> Option<AccessDecision> {
        let decisions = self.decisions.as_ref()?;
        match decisions.get(key).await {
            Some(decision) => {
                self.decision_stats.hit();
                Some(decision)
            }
            None => {
                self.decision_stats.miss();
                None
            }
        }
    }

    pub async fn put_decision(&self, key: DecisionKey, decision: AccessDecision, observed_epoch: u64) {
        let Some(decisions) = &self.decisions else {
            return;
        };
        if self.epoch() != observed_epoch {
            return;
        }
        decisions.insert(key.clone(), decision).await;
        if self.epoch() != observed_epoch {
            decisions.invalidate(&key).await;
        }
    }

    /// Drop every cached context and decision of one user
    pub async fn invalidate_user(&self, user_id: &str) -> Result<usize> {
        self.bump_epoch();

        if let Some(decisions) = &self.decisions {
            let owned = user_id.to_string();
            decisions
                .invalidate_entries_if(move |key, _| key.user_id == owned)
                .map_err(|e| GuardError::cache(format!("Decision invalidation failed: {}", e)))?;
        }

        let removed = self.backend.delete_by_pattern(&self.user_pattern(user_id)).await?;
        self.context_stats.invalidated(removed as u64);
        debug!(user_id, removed, "Invalidated cached user context");
        Ok(removed)
    }

    /// Drop the cached entries of several users
    pub async fn invalidate_users<I, S>(&self, user_ids: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut removed = 0;
        for user_id in user_ids {
            removed += self.invalidate_user(user_id.as_ref()).await?;
        }
        Ok(removed)
    }

    /// Drop every cached context and decision
    pub async fn invalidate_all(&self) -> Result<usize> {
        self.bump_epoch();

        if let Some(decisions) = &self.decisions {
            decisions.invalidate_all();
        }

        let pattern = format!("{}:ctx:*", self.key_prefix);
        let removed = self.backend.delete_by_pattern(&pattern).await?;
        self.context_stats.invalidated(removed as u64);
        debug!(removed, "Invalidated every cached user context");
        Ok(removed)
    }

    pub fn context_stats(&self) -> CacheStats {
        self.context_stats.snapshot()
    }

    pub fn decision_stats(&self) -> CacheStats {
        self.decision_stats.snapshot()
    }

    pub fn config(&self) -> &PermissionCacheConfig {
        &self.config
    }
}
