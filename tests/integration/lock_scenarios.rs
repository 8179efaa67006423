//! Entity lock integration tests
//!
//! Exercises the lock lifecycle through the `AccessCore` facade, including
//! contention between users and permission-checked force release.

#[cfg(test)]
mod tests {
    use crate::common::TestCore;
    use crate::common::assertions::LockOutcomeAssertions;
    use crate::{assert_err, assert_ok};
    use chrono::Duration;
    use tenant_guard::audit::AuditEventType;
    use tenant_guard::{GuardError, LockOutcome};

    async fn core() -> TestCore {
        let t = TestCore::new().await;
        t.assign("7", "t1:member");
        t.assign("9", "t1:member");
        t.assign("admin", "t1:tenant_admin");
        t.assign("outsider", "t2:tenant_admin");
        t.assign("root", "super_admin");
        t
    }

    #[tokio::test]
    async fn test_edit_conflict_and_force_release() {
        let t = core().await;

        let first = assert_ok!(t.core.acquire_lock("t1", "job", "42", "7", "editing", Some(30)).await);
        first.assert_held_by("7");

        let second = assert_ok!(t.core.acquire_lock("t1", "job", "42", "9", "editing", Some(30)).await);
        second.assert_held_by("7");
        let err = assert_err!(second.into_result());
        assert!(matches!(err, GuardError::LockConflict { .. }));
        assert!(err.to_string().ends_with("edited by 7"));

        let forced = assert_ok!(t.core.force_release_lock("t1", "job", "42", "root").await);
        assert!(matches!(forced, LockOutcome::ForceReleased { ref forced_by, .. } if forced_by == "root"));

        let third = assert_ok!(t.core.acquire_lock("t1", "job", "42", "9", "editing", None).await);
        assert!(matches!(third, LockOutcome::Acquired(_)));
        third.assert_held_by("9");
    }

    #[tokio::test]
    async fn test_same_user_cannot_reacquire() {
        let t = core().await;
        assert_ok!(t.core.acquire_lock("t1", "doc", "1", "7", "", None).await);

        let again = assert_ok!(t.core.acquire_lock("t1", "doc", "1", "7", "", None).await);
        assert!(matches!(again, LockOutcome::Conflict(_)));
    }

    #[tokio::test]
    async fn test_locks_are_per_tenant() {
        let t = core().await;
        assert_ok!(t.core.acquire_lock("t1", "doc", "1", "7", "", None).await);

        // same entity id in another tenant is a different lock
        let other = assert_ok!(t.core.acquire_lock("t2", "doc", "1", "9", "", None).await);
        assert!(other.is_success());

        assert_eq!(assert_ok!(t.core.list_locks("t1").await).len(), 1);
        assert_eq!(assert_ok!(t.core.list_locks("t2").await).len(), 1);
    }

    #[tokio::test]
    async fn test_release_requires_ownership() {
        let t = core().await;
        assert_ok!(t.core.acquire_lock("t1", "doc", "2", "7", "", None).await);

        let refused = assert_ok!(t.core.release_lock("t1", "doc", "2", "9").await);
        assert!(matches!(refused, LockOutcome::OwnershipViolation(_)));
        let held = assert_ok!(t.core.is_locked("t1", "doc", "2").await);
        assert_eq!(held.unwrap().locked_by, "7");

        let released = assert_ok!(t.core.release_lock("t1", "doc", "2", "7").await);
        assert!(matches!(released, LockOutcome::Released(_)));
        assert!(assert_ok!(t.core.is_locked("t1", "doc", "2").await).is_none());

        let twice = assert_ok!(t.core.release_lock("t1", "doc", "2", "7").await);
        assert!(matches!(twice, LockOutcome::NotFound(_)));
    }

    #[tokio::test]
    async fn test_expiry_frees_the_lock() {
        let t = core().await;
        assert_ok!(t.core.acquire_lock("t1", "doc", "3", "7", "", Some(5)).await);

        t.clock.advance(Duration::minutes(4));
        assert!(assert_ok!(t.core.is_locked("t1", "doc", "3").await).is_some());

        t.clock.advance(Duration::minutes(1));
        assert!(assert_ok!(t.core.is_locked("t1", "doc", "3").await).is_none());

        let taken = assert_ok!(t.core.acquire_lock("t1", "doc", "3", "9", "", None).await);
        taken.assert_held_by("9");
    }

    #[tokio::test]
    async fn test_renew_keeps_the_lock_alive() {
        let t = core().await;
        assert_ok!(t.core.acquire_lock("t1", "doc", "4", "7", "", Some(5)).await);

        t.clock.advance(Duration::minutes(4));
        let renewed = assert_ok!(t.core.renew_lock("t1", "doc", "4", "7", Some(5)).await);
        assert!(matches!(renewed, LockOutcome::Renewed(_)));

        t.clock.advance(Duration::minutes(4));
        assert!(assert_ok!(t.core.is_locked("t1", "doc", "4").await).is_some());

        let stolen = assert_ok!(t.core.renew_lock("t1", "doc", "4", "9", None).await);
        assert!(matches!(stolen, LockOutcome::OwnershipViolation(_)));
    }

    #[tokio::test]
    async fn test_force_release_permission_is_tenant_scoped() {
        let t = core().await;
        assert_ok!(t.core.acquire_lock("t1", "doc", "5", "7", "", None).await);

        for user in ["9", "outsider"] {
            let denied = assert_ok!(t.core.force_release_lock("t1", "doc", "5", user).await);
            assert!(matches!(denied, LockOutcome::Denied { .. }), "{} was not denied", user);
            assert!(matches!(denied.into_result(), Err(GuardError::LockDenied(_))));
        }
        assert!(assert_ok!(t.core.is_locked("t1", "doc", "5").await).is_some());

        let forced = assert_ok!(t.core.force_release_lock("t1", "doc", "5", "admin").await);
        assert!(forced.is_success());
        forced.assert_held_by("7");
    }

    #[tokio::test]
    async fn test_force_release_of_missing_lock() {
        let t = core().await;
        let outcome = assert_ok!(t.core.force_release_lock("t1", "doc", "none", "admin").await);
        assert!(matches!(outcome, LockOutcome::NotFound(_)));
    }

    #[tokio::test]
    async fn test_lock_lifecycle_is_audited() {
        let t = core().await;
        assert_ok!(t.core.acquire_lock("t1", "doc", "6", "7", "editing", None).await);
        assert_ok!(t.core.acquire_lock("t1", "doc", "6", "9", "editing", None).await);
        assert_ok!(t.core.force_release_lock("t1", "doc", "6", "admin").await);
        t.flush_audit().await;

        assert_eq!(t.sink.events_of(AuditEventType::LockAcquired).len(), 1);

        let rejected = t.sink.events_of(AuditEventType::LockRejected);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].actor_id, "9");
        assert_eq!(rejected[0].decision["holder"], "7");

        let forced = t.sink.events_of(AuditEventType::LockForceReleased);
        assert_eq!(forced.len(), 1);
        assert_eq!(forced[0].decision["original_owner"], "7");
        assert_eq!(forced[0].decision["forced_by"], "admin");

        // the permission check behind the force release is audited too
        let checks = t.sink.events_of(AuditEventType::AccessDecision);
        assert!(checks.iter().any(|e| e.actor_id == "admin" && e.decision["allowed"] == true));
    }

    #[tokio::test]
    async fn test_concurrent_acquire_across_tasks() {
        let t = core().await;
        let core = std::sync::Arc::new(t.core);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let core = core.clone();
                tokio::spawn(async move {
                    core.acquire_lock("t1", "doc", "hot", &format!("u{}", i), "", None)
                        .await
                        .unwrap()
                })
            })
            .collect();

        let outcomes = futures::future::join_all(tasks).await;
        let winners = outcomes
            .into_iter()
            .map(|r| r.unwrap())
            .filter(|o| matches!(o, LockOutcome::Acquired(_)))
            .count();
        assert_eq!(winners, 1);
    }
}
