//! Access decision engine
//!
//! Evaluation is a pure function of the context and the request. The engine
//! only touches the outside world to hand every decision to the audit emitter.

use super::decision::{AccessDecision, AccessRequest, DecisionReason, ResourceTarget};
use super::pattern::Scope;
use super::types::{Permission, UserContext};
use crate::audit::{AuditEmitter, AuditEvent, AuditEventType};
use crate::config::RbacConfig;
use serde_json::json;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

const READ_ACTION: &str = "read";
const UNKNOWN_ACTOR: &str = "unknown";

/// Decides allow/deny for access requests
#[derive(Debug, Clone)]
pub struct AccessDecisionEngine {
    read_actions: HashSet<String>,
    audit: Arc<AuditEmitter>,
}

impl AccessDecisionEngine {
    pub fn new(config: &RbacConfig, audit: Arc<AuditEmitter>) -> Self {
        Self {
            read_actions: config.read_actions.iter().cloned().collect(),
            audit,
        }
    }

    /// Whether `action` may use the read-only fallback
    pub fn is_read_action(&self, action: &str) -> bool {
        self.read_actions.contains(action)
    }

    /// Evaluate a request without auditing it
    pub fn evaluate(&self, context: Option<&UserContext>, request: &AccessRequest) -> AccessDecision {
        let Some(context) = context else {
            return AccessDecision::context_missing();
        };

        if context.is_super_admin {
            return AccessDecision::super_admin();
        }

        if let Some(permission) = best_match(context, request, &request.action) {
            return AccessDecision::matched(permission.clone());
        }

        if request.allow_read_only_fallback && self.is_read_action(&request.action) {
            if let Some(permission) = best_match(context, request, READ_ACTION) {
                return AccessDecision::read_only_fallback(permission.clone());
            }
        }

        AccessDecision::no_match()
    }

    /// Evaluate a request and emit the decision to the audit trail
    pub fn can_access(&self, context: Option<&UserContext>, request: &AccessRequest) -> AccessDecision {
        let decision = self.evaluate(context, request);
        let (actor_id, tenant_id) = actor_of(context, request);
        self.record(actor_id, tenant_id, request, &decision);
        decision
    }

    /// Emit an audit event for a decision made elsewhere (e.g. served from cache)
    pub fn record(
        &self,
        actor_id: &str,
        tenant_id: &str,
        request: &AccessRequest,
        decision: &AccessDecision,
    ) {
        debug!(
            actor_id,
            tenant_id,
            request = %request,
            allowed = decision.allowed,
            reason = %decision.reason,
            "Access decision"
        );

        let event_type = if decision.reason == DecisionReason::SuperAdminBypass {
            AuditEventType::SuperAdminBypass
        } else {
            AuditEventType::AccessDecision
        };

        let input = serde_json::to_value(request).unwrap_or_else(|_| json!({ "request": request.to_string() }));
        let outcome = json!({
            "allowed": decision.allowed,
            "reason": decision.reason,
            "matched_permission": decision.matched_permission.as_ref().map(|p| json!({
                "id": p.id,
                "pattern": p.pattern.to_string(),
                "priority": p.priority,
                "version": p.version,
            })),
        });

        self.audit
            .emit(AuditEvent::new(event_type, actor_id, tenant_id, input, outcome));
    }
}

fn actor_of<'a>(context: Option<&'a UserContext>, request: &'a AccessRequest) -> (&'a str, &'a str) {
    match context {
        Some(context) => (&context.user_id, &context.tenant_id),
        None => (
            UNKNOWN_ACTOR,
            request.target.tenant_id.as_deref().unwrap_or_default(),
        ),
    }
}

/// Winning permission for `(request.resource, action, request.scope)`
///
/// Among matches the highest priority wins, then the more specific pattern,
/// then the lexically smaller pattern and id so the result never depends on
/// set iteration order.
pub fn best_match<'a>(
    context: &'a UserContext,
    request: &AccessRequest,
    action: &str,
) -> Option<&'a Permission> {
    context
        .permissions
        .iter()
        .filter(|p| p.pattern.matches(&request.resource, action, request.scope))
        .filter(|p| within_boundary(p.pattern.scope, context, &request.target))
        .min_by(|a, b| precedence(a, b))
}

fn precedence(a: &Permission, b: &Permission) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.pattern.specificity().cmp(&a.pattern.specificity()))
        .then_with(|| a.pattern.to_string().cmp(&b.pattern.to_string()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Whether a grant at `granted` reaches the resource described by `target`
///
/// An unknown tenant or account is taken to be the requester's own. An `own`
/// grant needs a known owner.
fn within_boundary(granted: Scope, context: &UserContext, target: &ResourceTarget) -> bool {
    let same_tenant = || {
        target
            .tenant_id
            .as_ref()
            .is_none_or(|tenant| *tenant == context.tenant_id)
    };
    let same_account = || match &target.account_id {
        None => true,
        Some(account) => context.account_id.as_ref() == Some(account),
    };
    let same_owner = || target.owner_id.as_ref() == Some(&context.user_id);

    match granted {
        Scope::Global => true,
        Scope::Tenant => same_tenant(),
        Scope::Account => same_tenant() && same_account(),
        Scope::Own => same_tenant() && same_account() && same_owner(),
    }
}
