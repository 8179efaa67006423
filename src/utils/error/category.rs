//! Error categories used by callers to pick a response

use serde::{Deserialize, Serialize};

/// Coarse classification of a [`GuardError`](super::GuardError)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// 404-equivalent
    NotFound,
    /// Entity is being edited by another user
    Conflict,
    /// Caller lacks the right to perform the operation
    Forbidden,
    /// Store or cache unreachable; callers must fail closed
    Unavailable,
    /// Malformed input or configuration
    Invalid,
    /// Anything else
    Internal,
}

impl ErrorCategory {
    /// HTTP status code conventionally used for this category
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Forbidden => 403,
            Self::Unavailable => 503,
            Self::Invalid => 400,
            Self::Internal => 500,
        }
    }
}
