//! Error types for the access core

use thiserror::Error;

/// Result type alias for the access core
pub type Result<T> = std::result::Result<T, GuardError>;

/// Main error type for the access core
///
/// Denials are never reported through this type: an [`AccessDecision`] with
/// `allowed == false` or a failed [`LockOutcome`] is a normal return value.
/// Only infrastructure failures and admin-facing lookups surface here.
///
/// [`AccessDecision`]: crate::auth::rbac::AccessDecision
/// [`LockOutcome`]: crate::locks::LockOutcome
#[derive(Error, Debug)]
pub enum GuardError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed permission pattern
    #[error("Invalid permission pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The user context could not be built (store or cache unreachable)
    #[error("User context unavailable: {0}")]
    ContextUnavailable(String),

    /// Permission lookup failed
    #[error("Permission not found: {0}")]
    PermissionNotFound(String),

    /// Role lookup failed
    #[error("Role not found: {0}")]
    RoleNotFound(String),

    /// System roles cannot be deleted
    #[error("System role cannot be modified: {0}")]
    SystemRole(String),

    /// Active lock held by another user
    #[error("Entity {key} is being edited by {holder}")]
    LockConflict { key: String, holder: String },

    /// Caller is not the lock holder
    #[error("Lock on {key} is held by {holder}, not by the caller")]
    LockOwnershipViolation { key: String, holder: String },

    /// No active lock for the key
    #[error("No active lock on {0}")]
    LockNotFound(String),

    /// Force-release was refused by the decision engine
    #[error("Force release of {0} denied")]
    LockDenied(String),

    /// Persistence collaborator failures
    #[error("Store error: {0}")]
    Store(String),

    /// Cache backend failures
    #[error("Cache error: {0}")]
    Cache(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Redis errors
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}
