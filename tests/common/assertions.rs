//! Custom test assertions
//!
//! Domain-specific assertions for decisions and lock outcomes.

use tenant_guard::{AccessDecision, DecisionReason, LockOutcome};

/// Assertions for AccessDecision
pub trait DecisionAssertions {
    /// Assert the request was allowed for `reason`
    fn assert_allowed(&self, reason: DecisionReason);

    /// Assert the request was denied for `reason`
    fn assert_denied(&self, reason: DecisionReason);
}

impl DecisionAssertions for AccessDecision {
    fn assert_allowed(&self, reason: DecisionReason) {
        assert!(self.allowed, "Expected allowed, got {:?}", self);
        assert_eq!(self.reason, reason);
    }

    fn assert_denied(&self, reason: DecisionReason) {
        assert!(!self.allowed, "Expected denied, got {:?}", self);
        assert_eq!(self.reason, reason);
        assert!(self.matched_permission.is_none());
    }
}

/// Assertions for LockOutcome
pub trait LockOutcomeAssertions {
    /// Assert the lock is held by `user_id` after the operation
    fn assert_held_by(&self, user_id: &str);
}

impl LockOutcomeAssertions for LockOutcome {
    fn assert_held_by(&self, user_id: &str) {
        match self.lock() {
            Some(lock) => assert_eq!(lock.locked_by, user_id, "unexpected holder in {:?}", self),
            None => panic!("Expected a lock in {:?}", self),
        }
    }
}
