//! In-memory blacklist pattern cache.
//!
//! Rebuilt from the Store on startup, on TTL expiry (default 5 minutes)
//! and after any mutation. See [`BlacklistCache`].

mod cache;
mod error;
mod source;

pub use cache::{BlacklistCache, BlacklistMatch};
pub use error::BlacklistError;
pub use source::BlacklistSource;
