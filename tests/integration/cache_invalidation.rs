//! Permission cache integration tests
//!
//! Role administration through `RoleAdmin` must be visible to the very next
//! check, even with both cache tiers warm.

#[cfg(test)]
mod tests {
    use crate::assert_ok;
    use crate::common::TestCore;
    use tenant_guard::audit::AuditEventType;
    use tenant_guard::auth::PermissionUpdate;
    use tenant_guard::{AccessRequest, GuardError, Permission, Principal, Role, Scope};

    fn actor() -> Principal {
        Principal::new("root", "t1")
    }

    #[tokio::test]
    async fn test_assignment_visible_immediately() {
        let t = TestCore::new().await;
        let user = Principal::new("u1", "t1");
        let write = AccessRequest::new("write", "jobs", Scope::Tenant);

        assert!(!t.core.check(&user, &write).await.allowed);
        assert_ok!(t.core.admin().assign_user(&actor(), "u1", "t1:tenant_admin").await);
        assert!(t.core.check(&user, &write).await.allowed);

        assert!(assert_ok!(t.core.admin().unassign_user(&actor(), "u1", "t1:tenant_admin").await));
        assert!(!t.core.check(&user, &write).await.allowed);
    }

    #[tokio::test]
    async fn test_direct_store_writes_need_invalidation() {
        let t = TestCore::new().await;
        let user = Principal::new("u1", "t1");
        let read = AccessRequest::new("read", "jobs", Scope::Tenant);

        assert!(!t.core.check(&user, &read).await.allowed);

        // bypasses RoleAdmin, so the cached context is stale
        t.assign("u1", "t1:viewer");
        assert!(!t.core.check(&user, &read).await.allowed);

        assert_ok!(t.core.permissions().invalidate_user("u1").await);
        assert!(t.core.check(&user, &read).await.allowed);
    }

    #[tokio::test]
    async fn test_permission_update_reaches_every_holder() {
        let t = TestCore::new().await;
        let role = Role::for_tenant("t1:ops", "ops", "t1");
        assert_ok!(t.core.admin().save_role(&actor(), role).await);
        let permission = Permission::new("ops.deploy", "Deploy", "deploy.run.own".parse().unwrap());
        let created = assert_ok!(t.core.admin().create_permission(&actor(), permission).await);
        assert_eq!(created.version, 1);
        assert_ok!(t.core.admin().grant_permission(&actor(), "t1:ops", "ops.deploy").await);
        assert_ok!(t.core.admin().assign_user(&actor(), "u1", "t1:ops").await);
        assert_ok!(t.core.admin().assign_user(&actor(), "u2", "t1:ops").await);

        let tenant_wide = AccessRequest::new("run", "deploy", Scope::Tenant);
        for user in ["u1", "u2"] {
            assert!(!t.core.check(&Principal::new(user, "t1"), &tenant_wide).await.allowed);
        }

        let update = PermissionUpdate {
            pattern: Some("deploy.run.tenant".parse().unwrap()),
            ..PermissionUpdate::default()
        };
        let updated = assert_ok!(t.core.admin().update_permission(&actor(), "ops.deploy", update).await);
        assert_eq!(updated.version, 2);

        for user in ["u1", "u2"] {
            let decision = t.core.check(&Principal::new(user, "t1"), &tenant_wide).await;
            assert!(decision.allowed, "{} still sees the old pattern", user);
            assert_eq!(decision.matched_permission.unwrap().version, 2);
        }
    }

    #[tokio::test]
    async fn test_role_deletion_revokes_access() {
        let t = TestCore::new().await;
        assert_ok!(t.core.admin().save_role(&actor(), Role::for_tenant("t1:temp", "temp", "t1")).await);
        assert_ok!(t.core.admin().grant_permission(&actor(), "t1:temp", "perm.all.tenant").await);
        assert_ok!(t.core.admin().assign_user(&actor(), "u1", "t1:temp").await);

        let user = Principal::new("u1", "t1");
        let delete = AccessRequest::new("delete", "jobs", Scope::Tenant);
        assert!(t.core.check(&user, &delete).await.allowed);

        assert_ok!(t.core.admin().delete_role(&actor(), "t1:temp").await);
        assert!(!t.core.check(&user, &delete).await.allowed);
    }

    #[tokio::test]
    async fn test_system_roles_are_protected() {
        let t = TestCore::new().await;
        let err = t.core.admin().delete_role(&actor(), "t1:tenant_admin").await.unwrap_err();
        assert!(matches!(err, GuardError::SystemRole(_)));

        let err = t.core.admin().delete_role(&actor(), "t1:ghost").await.unwrap_err();
        assert!(matches!(err, GuardError::RoleNotFound(_)));
    }

    #[tokio::test]
    async fn test_mutations_are_audited() {
        let t = TestCore::new().await;
        assert_ok!(t.core.admin().assign_user(&actor(), "u1", "t1:viewer").await);
        assert_ok!(t.core.admin().revoke_permission(&actor(), "t1:viewer", "perm.read.tenant").await);
        t.flush_audit().await;

        let events = t.sink.events_of(AuditEventType::RoleMutated);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.actor_id == "root"));
        assert_eq!(events[0].input["operation"], "assign_user");
        assert_eq!(events[1].input["operation"], "revoke_permission");
    }

    #[tokio::test]
    async fn test_cache_statistics() {
        let t = TestCore::new().await;
        t.assign("u1", "t1:viewer");
        let user = Principal::new("u1", "t1");
        let read = AccessRequest::new("read", "jobs", Scope::Tenant);

        for _ in 0..3 {
            assert!(t.core.check(&user, &read).await.allowed);
        }

        let cache = t.core.permissions().cache();
        assert_eq!(cache.context_stats().misses, 1);
        assert_eq!(cache.context_stats().hits, 2);
        assert_eq!(cache.decision_stats().hits, 2);
    }
}
