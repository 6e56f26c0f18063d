//! Shared constants for logsink.
//!
//! Centralizes magic numbers that would otherwise be duplicated across crates.

/// Maximum number of results for any query (DoS protection).
pub const MAX_QUERY_LIMIT: usize = 1000;

/// Default number of results when a caller does not specify a limit.
pub const DEFAULT_QUERY_LIMIT: usize = 20;

/// PostgreSQL connection pool: maximum connections.
pub const PG_POOL_MAX_CONNECTIONS: u32 = 10;

/// PostgreSQL connection pool: acquire timeout in seconds.
pub const PG_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL connection pool: idle timeout in seconds.
pub const PG_POOL_IDLE_TIMEOUT_SECS: u64 = 600;

/// Embedding vector dimension. Nominal per the external embedding contract;
/// the store validates every stored vector against this length.
pub const EMBEDDING_DIMENSION: usize = 768;

/// Default cosine-similarity threshold above which the Embedding Worker
/// treats a neighbor as a merge candidate.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.85;

/// Default cosine-similarity threshold used by the Cleanup Scheduler's
/// near-duplicate reconciliation phase.
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.85;

/// Default age, in days, after which a `closed` issue is eligible for
/// cleanup-expiry.
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;

/// Default number of pending issues the Embedding Worker claims per tick.
pub const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 20;

/// Similarity score recorded on a DuplicateEdge produced by the Embedding
/// Worker's merge path — fixed per the merge-transaction contract rather
/// than reusing the neighbor-query score, since the merge decision itself
/// is what the edge documents.
pub const EMBEDDING_MERGE_EDGE_SCORE: f64 = 0.95;

/// Maximum number of nearest neighbors considered per similarity query.
pub const NEIGHBOR_QUERY_LIMIT: i64 = 5;

/// Maximum decoded image size accepted by the Image Extractor (10 MiB).
pub const DEFAULT_MAX_IMAGE_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Maximum issues considered per `application_id` during a single cleanup
/// near-duplicate reconciliation pass. Bounds the O(N^2) pairwise scan.
pub const CLEANUP_DEDUP_MAX_ISSUES: usize = 2000;

/// Sentinel scope key used by the Blacklist Cache for global patterns.
pub const BLACKLIST_GLOBAL_SCOPE: &str = "__global__";
