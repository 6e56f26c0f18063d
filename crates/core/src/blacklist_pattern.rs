//! Blacklist pattern domain type.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How a [`BlacklistPattern`]'s `pattern` text is matched against an
/// incoming message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum PatternType {
    /// `message == pattern`, byte-for-byte.
    Exact,
    /// Case-insensitive containment.
    Substring,
    /// Case-insensitive regex; an ill-formed pattern never matches.
    Regex,
}

impl PatternType {
    /// Returns the string representation of the pattern type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Exact => "exact",
            Self::Substring => "substring",
            Self::Regex => "regex",
        }
    }
}

impl FromStr for PatternType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "substring" => Ok(Self::Substring),
            "regex" => Ok(Self::Regex),
            other => Err(CoreError::InvalidPatternType(other.to_owned())),
        }
    }
}

/// A rule matched against incoming messages during admission. Scoped
/// globally (`application_id = None`) or to a single application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct BlacklistPattern {
    /// Database-assigned identifier.
    pub id: i64,
    /// The text or regex matched against incoming messages.
    pub pattern: String,
    /// How `pattern` is interpreted.
    pub pattern_type: PatternType,
    /// `None` means this pattern applies to every application.
    pub application_id: Option<String>,
    /// Operator-facing explanation, echoed back on a block.
    pub reason: Option<String>,
    /// Creation instant.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl BlacklistPattern {
    /// Reconstructs a pattern from fully-known field values, as when a
    /// storage backend maps a database row. `#[non_exhaustive]` otherwise
    /// leaves other crates no way to construct one directly.
    #[must_use]
    pub fn hydrate(
        id: i64,
        pattern: String,
        pattern_type: PatternType,
        application_id: Option<String>,
        reason: Option<String>,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self { id, pattern, pattern_type, application_id, reason, created_at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_type_round_trips() {
        for t in [PatternType::Exact, PatternType::Substring, PatternType::Regex] {
            assert_eq!(PatternType::from_str(t.as_str()).unwrap(), t);
        }
    }
}
