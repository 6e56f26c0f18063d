//! Issue-management classification enums: `type` and `effort`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The kind of work an issue represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum IssueType {
    /// A defect to be fixed.
    Bugfix,
    /// New functionality.
    Feature,
    /// Documentation-only work.
    Documentation,
}

impl IssueType {
    /// Returns the string representation of the issue type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Bugfix => "bugfix",
            Self::Feature => "feature",
            Self::Documentation => "documentation",
        }
    }
}

impl FromStr for IssueType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bugfix" => Ok(Self::Bugfix),
            "feature" => Ok(Self::Feature),
            "documentation" => Ok(Self::Documentation),
            other => Err(CoreError::InvalidIssueType(other.to_owned())),
        }
    }
}

/// Estimated effort to resolve an issue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Effort {
    /// Trivial fix.
    Low,
    /// Typical fix.
    Medium,
    /// Substantial work.
    High,
    /// Drop-everything severity.
    Critical,
}

impl Effort {
    /// Returns the string representation of the effort level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl FromStr for Effort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(CoreError::InvalidEffort(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_type_round_trips() {
        for t in [IssueType::Bugfix, IssueType::Feature, IssueType::Documentation] {
            assert_eq!(IssueType::from_str(t.as_str()).unwrap(), t);
        }
    }

    #[test]
    fn effort_round_trips_and_orders() {
        for e in [Effort::Low, Effort::Medium, Effort::High, Effort::Critical] {
            assert_eq!(Effort::from_str(e.as_str()).unwrap(), e);
        }
        assert!(Effort::Low < Effort::Critical);
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(IssueType::from_str("nope").is_err());
        assert!(Effort::from_str("nope").is_err());
    }
}
