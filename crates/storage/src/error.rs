//! Typed error enum for the storage crate.

use thiserror::Error;

/// Errors raised by the Store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying database driver failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Schema migration failed.
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    /// No issue or pattern matched the requested identity.
    #[error("not found")]
    NotFound,
    /// A unique-key constraint was violated (e.g. duplicate blacklist pattern).
    #[error("conflict: {0}")]
    Conflict(String),
    /// The requested transition is not legal from the entity's current state.
    #[error(
        "precondition failed: cannot transition to '{requested}' from current state '{current}'"
    )]
    PreconditionFailed {
        /// The state the entity was actually found in.
        current: String,
        /// The state the caller asked to transition to.
        requested: String,
    },
}

impl StorageError {
    /// Whether retrying the same operation might succeed without operator
    /// intervention.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// Whether this error represents "the requested entity does not exist".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Whether this error represents a unique-constraint conflict.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Maps a raw `sqlx::Error` from an INSERT/UPDATE into `Conflict` when it
    /// is a unique-violation, leaving every other error as `Database`.
    #[must_use]
    pub fn from_insert(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::Conflict(db_err.message().to_owned());
            }
        }
        Self::Database(err)
    }
}
