//! The Blacklist Cache's view of the Store: just enough to rebuild a
//! snapshot. Concrete stores implement this directly; it is intentionally
//! narrower than the full Store contract so this crate never depends on
//! `logsink-storage`.

use logsink_core::BlacklistPattern;

use crate::error::BlacklistError;

/// Supplies the full current set of blacklist patterns on demand.
#[async_trait::async_trait]
pub trait BlacklistSource: Send + Sync {
    /// Returns every pattern currently in the Store, both global and
    /// application-scoped.
    async fn list_patterns(&self) -> Result<Vec<BlacklistPattern>, BlacklistError>;
}
