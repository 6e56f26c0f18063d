//! Reads the handful of environment variables that have no sane default
//! and so cannot live in `logsink_service::config`'s `Default` impls.

use anyhow::{Context, Result};

/// `DATABASE_URL`, required; there is no embedded fallback database.
pub fn database_url() -> Result<String> {
    std::env::var("DATABASE_URL").context("DATABASE_URL must be set (postgres://...)")
}

/// `API_KEY`, required; there is no auth-disabled mode.
pub fn api_key() -> Result<String> {
    std::env::var("API_KEY").context("API_KEY must be set")
}
