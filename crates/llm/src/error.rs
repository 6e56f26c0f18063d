//! Typed error enum for the LLM crate.

use thiserror::Error;

/// Errors from LLM API operations. Used only by the Cleanup Scheduler's
/// optional refined-similarity step; the LLM is never on the admission
/// critical path.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The HTTP request itself failed.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    /// The provider responded with a non-2xx status.
    #[error("HTTP status {code}: {body}")]
    HttpStatus {
        /// HTTP status code.
        code: u16,
        /// Response body, truncated for logging.
        body: String,
    },
    /// The chat completion returned no choices.
    #[error("empty response: no choices returned")]
    EmptyResponse,
    /// The response body did not contain a parseable similarity score.
    #[error("could not parse similarity score from response")]
    UnparseableScore,
    /// The client is not configured (no API key set, or disabled by config).
    #[error("LLM client not configured")]
    NotConfigured,
}

impl LlmError {
    /// Whether this error is transient and should be retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::HttpRequest(_) => true,
            Self::HttpStatus { code, .. } => matches!(code, 429 | 500 | 502 | 503 | 529),
            Self::EmptyResponse | Self::UnparseableScore | Self::NotConfigured => false,
        }
    }
}
