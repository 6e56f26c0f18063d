//! Typed error enum for the embeddings crate.

use thiserror::Error;

/// Errors from Embedding Client operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The HTTP request itself failed (network, TLS, timeout).
    #[error("embedding request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    /// The provider responded with a non-2xx status.
    #[error("embedding provider returned status {code}: {body}")]
    HttpStatus {
        /// HTTP status code.
        code: u16,
        /// Response body, truncated for logging.
        body: String,
    },
    /// The response body did not contain a usable embedding vector.
    #[error("embedding response missing vector field")]
    MissingVector,
    /// The provider is not configured (no API key / URL set).
    #[error("embedding provider not configured")]
    NotConfigured,
}

impl EmbeddingError {
    /// Whether retrying the same call might succeed (matches the
    /// workspace's `is_transient` convention).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::HttpRequest(_) => true,
            Self::HttpStatus { code, .. } => matches!(code, 429 | 500 | 502 | 503),
            Self::MissingVector | Self::NotConfigured => false,
        }
    }
}
