//! Access decision integration tests
//!
//! Drives `AccessCore::check` with the acme policy seed and verifies tenant,
//! account and owner boundaries together with the audit trail.

#[cfg(test)]
mod tests {
    use crate::common::assertions::DecisionAssertions;
    use crate::common::{PolicyFactory, TestCore};
    use tenant_guard::audit::AuditEventType;
    use tenant_guard::auth::MemoryRoleStore;
    use tenant_guard::config::Config;
    use tenant_guard::{AccessRequest, DecisionReason, Principal, ResourceTarget, Scope};

    async fn acme() -> TestCore {
        let config = Config::default();
        let store =
            MemoryRoleStore::from_seed(&PolicyFactory::acme(), &config.rbac.super_admin_role)
                .unwrap();
        TestCore::with_store(config, store).await
    }

    // ==================== Tenant boundary ====================

    #[tokio::test]
    async fn test_tenant_admin_manages_own_tenant() {
        let t = acme().await;
        let alice = Principal::new("alice", "acme");

        let decision = t
            .core
            .check(
                &alice,
                &AccessRequest::new("delete", "jobs", Scope::Tenant)
                    .with_resource_id("j1")
                    .with_target(ResourceTarget::tenant("acme")),
            )
            .await;
        decision.assert_allowed(DecisionReason::Matched);
        assert_eq!(decision.matched_permission.unwrap().id, "perm.all.tenant");
    }

    #[tokio::test]
    async fn test_tenant_admin_cannot_reach_other_tenant() {
        let t = acme().await;

        // resource owned by another tenant
        let alice = Principal::new("alice", "acme");
        let foreign = AccessRequest::new("delete", "jobs", Scope::Tenant)
            .with_target(ResourceTarget::tenant("globex"));
        t.core
            .check(&alice, &foreign)
            .await
            .assert_denied(DecisionReason::NoMatch);

        // acting within the other tenant carries no acme roles
        let alice_in_globex = Principal::new("alice", "globex");
        t.core
            .check(&alice_in_globex, &AccessRequest::new("read", "jobs", Scope::Tenant))
            .await
            .assert_denied(DecisionReason::NoMatch);
    }

    #[tokio::test]
    async fn test_global_request_needs_global_grant() {
        let t = acme().await;
        let alice = Principal::new("alice", "acme");

        t.core
            .check(&alice, &AccessRequest::new("delete", "tenants", Scope::Global))
            .await
            .assert_denied(DecisionReason::NoMatch);
    }

    // ==================== Account and owner boundaries ====================

    #[tokio::test]
    async fn test_account_scoped_permission() {
        let t = acme().await;
        let carol = Principal::new("carol", "acme").with_account("a1");
        let approve = |account: &str| {
            AccessRequest::new("approve", "invoices", Scope::Account)
                .with_target(ResourceTarget::tenant("acme").with_account(account))
        };

        let decision = t.core.check(&carol, &approve("a1")).await;
        decision.assert_allowed(DecisionReason::Matched);
        let matched = decision.matched_permission.unwrap();
        assert_eq!(matched.id, "invoices.approve");
        assert_eq!(matched.priority, 10);

        t.core
            .check(&carol, &approve("a2"))
            .await
            .assert_denied(DecisionReason::NoMatch);
    }

    #[tokio::test]
    async fn test_member_edits_only_own_records() {
        let t = acme().await;
        let bob = Principal::new("bob", "acme");
        let edit = |owner: &str| {
            AccessRequest::new("update", "notes", Scope::Own)
                .with_target(ResourceTarget::tenant("acme").with_owner(owner))
        };

        t.core
            .check(&bob, &edit("bob"))
            .await
            .assert_allowed(DecisionReason::Matched);
        t.core
            .check(&bob, &edit("alice"))
            .await
            .assert_denied(DecisionReason::NoMatch);
    }

    #[tokio::test]
    async fn test_own_grant_denies_unknown_owner() {
        let t = acme().await;
        let bob = Principal::new("bob", "acme");

        t.core
            .check(&bob, &AccessRequest::new("update", "notes", Scope::Own))
            .await
            .assert_denied(DecisionReason::NoMatch);

        let someone_elses = AccessRequest::new("delete", "jobs", Scope::Own).with_resource_id("job-owned-by-u9");
        t.core
            .check(&bob, &someone_elses)
            .await
            .assert_denied(DecisionReason::NoMatch);
    }

    // ==================== Read-only fallback ====================

    #[tokio::test]
    async fn test_read_fallback_only_when_requested() {
        let t = acme().await;
        let bob = Principal::new("bob", "acme");

        let plain = AccessRequest::new("list", "reports", Scope::Tenant);
        t.core
            .check(&bob, &plain)
            .await
            .assert_denied(DecisionReason::NoMatch);

        let decision = t.core.check(&bob, &plain.with_read_only_fallback()).await;
        decision.assert_allowed(DecisionReason::ReadOnlyFallback);
        assert_eq!(decision.matched_permission.unwrap().id, "perm.read.tenant");
    }

    #[tokio::test]
    async fn test_read_fallback_ignores_write_actions() {
        let t = acme().await;
        let carol = Principal::new("carol", "acme");

        t.core
            .check(
                &carol,
                &AccessRequest::new("delete", "reports", Scope::Tenant).with_read_only_fallback(),
            )
            .await
            .assert_denied(DecisionReason::NoMatch);
    }

    // ==================== Super admin ====================

    #[tokio::test]
    async fn test_super_admin_bypasses_every_boundary() {
        let t = acme().await;
        let root = Principal::new("root", "globex");

        let request = AccessRequest::new("purge", "tenants", Scope::Global)
            .with_target(ResourceTarget::tenant("acme").with_owner("bob"));
        let decision = t.core.check(&root, &request).await;
        decision.assert_allowed(DecisionReason::SuperAdminBypass);
        assert!(decision.matched_permission.is_none());

        t.flush_audit().await;
        let events = t.sink.events_of(AuditEventType::SuperAdminBypass);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].actor_id, "root");
        assert_eq!(events[0].tenant_id, "globex");
    }

    // ==================== Unknown users and audit ====================

    #[tokio::test]
    async fn test_unknown_user_is_denied_and_audited() {
        let t = acme().await;
        let nobody = PolicyFactory::stranger("acme");

        t.core
            .check(&nobody, &AccessRequest::new("read", "jobs", Scope::Own))
            .await
            .assert_denied(DecisionReason::NoMatch);

        t.flush_audit().await;
        let events = t.sink.events_of(AuditEventType::AccessDecision);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].actor_id, nobody.user_id);
        assert_eq!(events[0].decision["allowed"], false);
        assert_eq!(events[0].input["action"], "read");
    }

    #[tokio::test]
    async fn test_decision_without_context_fails_closed() {
        let t = acme().await;
        t.core
            .can_access(None, &AccessRequest::new("read", "jobs", Scope::Own))
            .await
            .assert_denied(DecisionReason::ContextMissing);
    }

    #[tokio::test]
    async fn test_priority_beats_broader_grant() {
        let t = TestCore::new().await;
        t.assign("u1", "t1:tenant_admin");
        t.store.insert_permission(
            tenant_guard::Permission::new("jobs.read", "Read jobs", "jobs.read.tenant".parse().unwrap())
                .with_priority(50),
        );
        t.store.link("t1:tenant_admin", "jobs.read");

        let decision = t
            .core
            .check(&Principal::new("u1", "t1"), &AccessRequest::new("read", "jobs", Scope::Tenant))
            .await;
        assert_eq!(decision.matched_permission.unwrap().id, "jobs.read");
    }
}
