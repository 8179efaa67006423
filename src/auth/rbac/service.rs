//! Permission service
//!
//! Wires the resolver, the cache and the decision engine together. This is
//! the entry point the route layer calls.

use super::cache::{DecisionKey, PermissionCache};
use super::decision::{AccessDecision, AccessRequest};
use super::engine::AccessDecisionEngine;
use super::resolver::ContextResolver;
use super::types::{Principal, UserContext};
use crate::utils::error::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache-backed permission checks
#[derive(Debug, Clone)]
pub struct PermissionService {
    resolver: ContextResolver,
    cache: Arc<PermissionCache>,
    engine: AccessDecisionEngine,
}

impl PermissionService {
    pub fn new(
        resolver: ContextResolver,
        cache: Arc<PermissionCache>,
        engine: AccessDecisionEngine,
    ) -> Self {
        Self {
            resolver,
            cache,
            engine,
        }
    }

    /// Cached context for `principal`, resolved from the store on a miss
    pub async fn resolve_context(&self, principal: &Principal) -> Result<UserContext> {
        if let Some(context) = self.cache.get_context(principal).await {
            return Ok(context);
        }

        let epoch = self.cache.epoch();
        let context = self.resolver.resolve(principal).await?;

        match self.cache.put_context(&context, epoch).await {
            Ok(stored) => {
                debug!(user_id = %principal.user_id, stored, "Cached resolved context");
            }
            Err(e) => {
                warn!(user_id = %principal.user_id, error = %e, "Failed to cache user context");
            }
        }
        Ok(context)
    }

    /// Decide `request` for an already resolved context
    ///
    /// Every call is audited, including answers served from the decision tier.
    pub async fn can_access(
        &self,
        context: Option<&UserContext>,
        request: &AccessRequest,
    ) -> AccessDecision {
        let Some(context) = context else {
            return self.engine.can_access(None, request);
        };

        if context.is_super_admin {
            return self.engine.can_access(Some(context), request);
        }

        let key = DecisionKey::new(context, request);
        if let Some(decision) = self.cache.get_decision(&key).await {
            self.engine
                .record(&context.user_id, &context.tenant_id, request, &decision);
            return decision;
        }

        let epoch = self.cache.epoch();
        let decision = self.engine.can_access(Some(context), request);
        self.cache.put_decision(key, decision.clone(), epoch).await;
        decision
    }

    /// Resolve and decide in one call
    ///
    /// A context that cannot be resolved yields a `CONTEXT_MISSING` denial.
    pub async fn check(&self, principal: &Principal, request: &AccessRequest) -> AccessDecision {
        match self.resolve_context(principal).await {
            Ok(context) => self.can_access(Some(&context), request).await,
            Err(e) => {
                warn!(
                    user_id = %principal.user_id,
                    tenant_id = %principal.tenant_id,
                    error = %e,
                    "Denying request without a user context"
                );
                let decision = AccessDecision::context_missing();
                self.engine
                    .record(&principal.user_id, &principal.tenant_id, request, &decision);
                decision
            }
        }
    }

    pub async fn invalidate_user(&self, user_id: &str) -> Result<usize> {
        self.cache.invalidate_user(user_id).await
    }

    pub async fn invalidate_all(&self) -> Result<usize> {
        self.cache.invalidate_all().await
    }

    pub fn cache(&self) -> &Arc<PermissionCache> {
        &self.cache
    }

    pub fn engine(&self) -> &AccessDecisionEngine {
        &self.engine
    }

    pub fn resolver(&self) -> &ContextResolver {
        &self.resolver
    }
}
