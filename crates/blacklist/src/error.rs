//! Typed error enum for the blacklist crate.

use thiserror::Error;

/// Errors raised while refreshing or querying the Blacklist Cache.
#[derive(Debug, Error)]
pub enum BlacklistError {
    /// The backing source (the Store) failed to list patterns.
    #[error("failed to load blacklist patterns: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BlacklistError {
    /// Whether retrying the same operation might succeed without operator
    /// intervention (matches the workspace's `is_transient` convention).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Source(_))
    }
}
