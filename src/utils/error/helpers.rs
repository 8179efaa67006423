//! Helper functions for creating specific error types

use super::category::ErrorCategory;
use super::types::GuardError;

/// Helper functions for creating specific errors
impl GuardError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn invalid_pattern<P: Into<String>, R: Into<String>>(pattern: P, reason: R) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    pub fn context_unavailable<S: Into<String>>(message: S) -> Self {
        Self::ContextUnavailable(message.into())
    }

    pub fn permission_not_found<S: Into<String>>(id: S) -> Self {
        Self::PermissionNotFound(id.into())
    }

    pub fn role_not_found<S: Into<String>>(id: S) -> Self {
        Self::RoleNotFound(id.into())
    }

    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store(message.into())
    }

    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Map the error onto the category a route layer responds with
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::PermissionNotFound(_) | Self::RoleNotFound(_) | Self::LockNotFound(_) => {
                ErrorCategory::NotFound
            }
            Self::LockConflict { .. } => ErrorCategory::Conflict,
            Self::LockOwnershipViolation { .. } | Self::LockDenied(_) | Self::SystemRole(_) => {
                ErrorCategory::Forbidden
            }
            Self::ContextUnavailable(_) | Self::Store(_) | Self::Cache(_) => {
                ErrorCategory::Unavailable
            }
            #[cfg(feature = "redis")]
            Self::Redis(_) => ErrorCategory::Unavailable,
            Self::Config(_)
            | Self::Validation(_)
            | Self::InvalidPattern { .. }
            | Self::Yaml(_) => ErrorCategory::Invalid,
            Self::Serialization(_) | Self::Io(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Whether the failure came from infrastructure rather than the request
    pub fn is_infrastructure(&self) -> bool {
        matches!(self.category(), ErrorCategory::Unavailable)
    }
}
