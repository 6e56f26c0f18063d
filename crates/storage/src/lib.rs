//! Postgres-backed persistence for issues, blacklist patterns and
//! duplicate edges.
//!
//! `sqlx` + `pgvector` is the only backend this workspace carries (see
//! the Resolved Open Questions note on dual-backend support); everything
//! downstream depends on the [`IssueStore`] trait, not on this crate's
//! concrete types, so swapping backends later stays contained here.

mod error;
mod postgres;
mod row;
mod store;

pub use error::StorageError;
pub use postgres::{PgStore, PoolOptions};
pub use store::{
    AdmitAction, AdmitResult, BlacklistPatternPatch, BlacklistStatistics, IssueFieldsPatch,
    IssueStatistics, IssueStore, NewBlacklistPattern, NewIssueInput, SetDoneFields,
};

use logsink_blacklist::{BlacklistError, BlacklistSource};
use logsink_core::BlacklistPattern;

#[async_trait::async_trait]
impl BlacklistSource for PgStore {
    async fn list_patterns(&self) -> Result<Vec<BlacklistPattern>, BlacklistError> {
        IssueStore::list_patterns(self, None)
            .await
            .map_err(|err| BlacklistError::Source(Box::new(err)))
    }
}
