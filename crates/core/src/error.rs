//! Typed error enum for the core crate.

use thiserror::Error;

/// Errors originating from core domain type parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Failed to parse an issue state string.
    #[error("invalid issue state: {0}")]
    InvalidIssueState(String),
    /// Failed to parse an issue type string.
    #[error("invalid issue type: {0}")]
    InvalidIssueType(String),
    /// Failed to parse an effort string.
    #[error("invalid effort: {0}")]
    InvalidEffort(String),
    /// Failed to parse a blacklist pattern type string.
    #[error("invalid pattern type: {0}")]
    InvalidPatternType(String),
}
