//! Typed error enum for the service crate.

use logsink_blacklist::BlacklistError;
use logsink_embeddings::EmbeddingError;
use logsink_images::ImageError;
use logsink_storage::StorageError;
use thiserror::Error;

/// Errors raised by the Admission Pipeline, Lifecycle Engine, Embedding
/// Worker and Cleanup Scheduler.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required field was missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The admission was rejected by the Blacklist Cache.
    #[error("blocked by blacklist pattern {pattern:?}: {reason:?}")]
    Blocked {
        /// The pattern that matched.
        pattern: String,
        /// The operator-supplied reason, if any.
        reason: Option<String>,
    },
    /// The Store returned an error.
    #[error("store error: {0}")]
    Storage(#[from] StorageError),
    /// The Blacklist Cache could not be refreshed or queried.
    #[error("blacklist error: {0}")]
    Blacklist(#[from] BlacklistError),
    /// The Image Extractor could not create its target directory.
    #[error("image error: {0}")]
    Image(#[from] ImageError),
    /// The Embedding Client failed; only surfaced when the caller can act
    /// on it directly (e.g. `POST /embedding/process/:logId`) — the
    /// worker's own per-tick loop never propagates this variant, it falls
    /// an issue back to `open` instead.
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
    /// A dependent feature (embedding or LLM) is disabled or unreachable.
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// A singleton background task was already running.
    #[error("busy: a run is already in progress")]
    Busy,
}

impl ServiceError {
    /// Whether retrying the same operation might succeed without operator
    /// intervention.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Storage(err) => err.is_transient(),
            Self::Blacklist(err) => err.is_transient(),
            Self::Embedding(err) => err.is_transient(),
            Self::Unavailable(_) => true,
            Self::InvalidInput(_) | Self::Blocked { .. } | Self::Image(_) | Self::Busy => false,
        }
    }

    /// Whether this error represents "the requested entity does not exist".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(err) if err.is_not_found())
    }

    /// Whether this error represents a unique-constraint conflict or a
    /// busy singleton (the HTTP boundary maps both to `409`).
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Busy) || matches!(self, Self::Storage(err) if err.is_duplicate())
    }
}
