//! Permission pattern model
//!
//! A pattern has the shape `resource.action.scope`, where the resource and
//! action segments may be the wildcard `*`.

use crate::utils::error::GuardError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const WILDCARD: &str = "*";

/// One segment of a pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Exact(String),
    Wildcard,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw == WILDCARD {
            Self::Wildcard
        } else {
            Self::Exact(raw.to_string())
        }
    }

    /// Whether this segment accepts the requested value
    pub fn matches(&self, requested: &str) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Exact(value) => value == requested,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(value) => f.write_str(value),
            Self::Wildcard => f.write_str(WILDCARD),
        }
    }
}

/// Breadth of resources a permission covers, narrowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Own,
    Account,
    Tenant,
    Global,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Own => "own",
            Self::Account => "account",
            Self::Tenant => "tenant",
            Self::Global => "global",
        }
    }

    /// Whether a grant at this scope can satisfy a request at `requested`
    ///
    /// Only the breadth is compared here; the tenant, account and owner
    /// boundaries are checked by the decision engine.
    pub fn covers(&self, requested: Scope) -> bool {
        *self >= requested
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "own" => Ok(Self::Own),
            "account" => Ok(Self::Account),
            "tenant" => Ok(Self::Tenant),
            "global" => Ok(Self::Global),
            other => Err(GuardError::validation(format!("Unknown scope: {}", other))),
        }
    }
}

/// Parsed `resource.action.scope` pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionPattern {
    pub resource: Segment,
    pub action: Segment,
    pub scope: Scope,
}

impl PermissionPattern {
    pub fn new(resource: Segment, action: Segment, scope: Scope) -> Self {
        Self {
            resource,
            action,
            scope,
        }
    }

    /// True if the resource or action segment is `*`
    pub fn is_wildcard(&self) -> bool {
        self.resource.is_wildcard() || self.action.is_wildcard()
    }

    /// Number of exact segments among resource and action
    pub fn specificity(&self) -> u8 {
        u8::from(!self.resource.is_wildcard()) + u8::from(!self.action.is_wildcard())
    }

    /// Segment-wise match of resource and action, plus scope breadth
    pub fn matches(&self, resource: &str, action: &str, scope: Scope) -> bool {
        self.resource.matches(resource) && self.action.matches(action) && self.scope.covers(scope)
    }
}

impl fmt::Display for PermissionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.resource, self.action, self.scope)
    }
}

impl FromStr for PermissionPattern {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        let [resource, action, scope] = parts.as_slice() else {
            return Err(GuardError::invalid_pattern(
                s,
                "expected three segments: resource.action.scope",
            ));
        };

        if resource.is_empty() || action.is_empty() {
            return Err(GuardError::invalid_pattern(s, "empty segment"));
        }

        let scope = scope
            .parse::<Scope>()
            .map_err(|_| GuardError::invalid_pattern(s, format!("unknown scope '{}'", scope)))?;

        Ok(Self::new(Segment::parse(resource), Segment::parse(action), scope))
    }
}

impl TryFrom<String> for PermissionPattern {
    type Error = GuardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PermissionPattern> for String {
    fn from(pattern: PermissionPattern) -> Self {
        pattern.to_string()
    }
}
