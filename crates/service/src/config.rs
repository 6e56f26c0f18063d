//! Environment-driven configuration for the admission pipeline, embedding
//! worker and cleanup scheduler. Read once at startup by `logsink-cli`.

use logsink_core::{env_parse_with_default, DEFAULT_DUPLICATE_THRESHOLD, DEFAULT_EMBEDDING_BATCH_SIZE, DEFAULT_MAX_AGE_DAYS, DEFAULT_MAX_IMAGE_SIZE_BYTES, DEFAULT_SIMILARITY_THRESHOLD};

/// Admission and image-extraction settings.
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Directory image blobs are persisted to.
    pub images_dir: String,
    /// Maximum decoded image size accepted.
    pub max_image_size_bytes: usize,
    /// Lowercased file extensions accepted, without the leading dot.
    pub allowed_image_types: Vec<String>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            images_dir: env_parse_with_default("IMAGES_DIR", "./data/images".to_owned()),
            max_image_size_bytes: env_parse_with_default(
                "MAX_IMAGE_SIZE_BYTES",
                DEFAULT_MAX_IMAGE_SIZE_BYTES,
            ),
            allowed_image_types: env_parse_with_default(
                "ALLOWED_IMAGE_TYPES",
                "png,jpg,jpeg,gif,webp".to_owned(),
            )
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect(),
        }
    }
}

/// Lifecycle policy settings.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleConfig {
    /// Whether setting embeddings is enabled; governs the admission
    /// pipeline's initial state (§4.1).
    pub embedding_enabled: bool,
    /// Whether a non-empty `plan` on a `pending` issue also promotes it
    /// to `open`, alongside the embedding-promotes default.
    pub plan_promotes: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            embedding_enabled: env_parse_with_default("EMBEDDING_ENABLED", true),
            plan_promotes: env_parse_with_default("LIFECYCLE_PLAN_PROMOTES", false),
        }
    }
}

/// Embedding Worker settings.
#[derive(Debug, Clone)]
pub struct EmbeddingWorkerConfig {
    /// Whether the worker runs at all.
    pub enabled: bool,
    /// How often the worker ticks on its own timer.
    pub tick_secs: u64,
    /// Maximum `pending` issues claimed per tick.
    pub batch_size: i64,
    /// Per-call timeout to the Embedding Client, in milliseconds.
    pub timeout_ms: u64,
    /// Minimum cosine similarity for a neighbor to be a merge candidate.
    pub similarity_threshold: f32,
}

impl Default for EmbeddingWorkerConfig {
    fn default() -> Self {
        Self {
            enabled: env_parse_with_default("EMBEDDING_ENABLED", true),
            tick_secs: env_parse_with_default("EMBEDDING_TICK_SECS", 120),
            batch_size: env_parse_with_default("EMBEDDING_BATCH_SIZE", DEFAULT_EMBEDDING_BATCH_SIZE as i64),
            timeout_ms: env_parse_with_default("EMBEDDING_TIMEOUT_MS", 10_000),
            similarity_threshold: env_parse_with_default(
                "SIMILARITY_THRESHOLD",
                DEFAULT_SIMILARITY_THRESHOLD,
            ),
        }
    }
}

/// Cleanup Scheduler settings.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Whether the scheduler runs at all.
    pub enabled: bool,
    /// Cron expression for the periodic run.
    pub cron: String,
    /// Minimum similarity for near-duplicate reconciliation to merge a pair.
    pub duplicate_threshold: f64,
    /// Age, in days, after which a `closed` issue is expired.
    pub max_age_days: i64,
    /// Maximum issues considered per application during reconciliation.
    pub batch_size: i64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: env_parse_with_default("CLEANUP_ENABLED", true),
            cron: env_parse_with_default("CLEANUP_CRON", "0 2 * * *".to_owned()),
            duplicate_threshold: env_parse_with_default(
                "DUPLICATE_THRESHOLD",
                DEFAULT_DUPLICATE_THRESHOLD,
            ),
            max_age_days: env_parse_with_default("MAX_AGE_DAYS", DEFAULT_MAX_AGE_DAYS),
            batch_size: env_parse_with_default("CLEANUP_BATCH_SIZE", 100),
        }
    }
}

/// Blacklist settings owned by the service layer (the cache itself lives
/// in `logsink-blacklist`).
#[derive(Debug, Clone, Copy)]
pub struct BlacklistConfig {
    /// Whether blacklist checking runs during admission.
    pub enabled: bool,
    /// Whether adding/updating a pattern auto-closes matching issues.
    pub auto_delete: bool,
    /// Cache refresh interval, in milliseconds.
    pub cache_ttl_ms: u64,
}

impl Default for BlacklistConfig {
    fn default() -> Self {
        Self {
            enabled: env_parse_with_default("BLACKLIST_ENABLED", true),
            auto_delete: env_parse_with_default("BLACKLIST_AUTO_DELETE", false),
            cache_ttl_ms: env_parse_with_default("BLACKLIST_CACHE_TTL_MS", 300_000),
        }
    }
}

/// LLM settings for the Cleanup Scheduler's refined-similarity step.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Whether the LLM client is constructed and consulted at all.
    pub enabled: bool,
    /// API key; empty when `enabled` is false.
    pub api_key: String,
    /// Base URL of an OpenAI-compatible chat-completions API.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Sampling `max_tokens`.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: env_parse_with_default("LLM_ENABLED", false),
            api_key: env_parse_with_default("LLM_API_KEY", String::new()),
            base_url: env_parse_with_default("LLM_API_URL", "https://api.openai.com/v1".to_owned()),
            model: env_parse_with_default("LLM_MODEL", logsink_llm::DEFAULT_MODEL.to_owned()),
            max_tokens: env_parse_with_default("LLM_MAX_TOKENS", 512),
            temperature: env_parse_with_default("LLM_TEMPERATURE", 0.0),
        }
    }
}

/// Embedding Client connection settings, read here because the pipeline
/// and worker both need them to construct `logsink_embeddings::EmbeddingClient`.
#[derive(Debug, Clone)]
pub struct EmbeddingClientConfig {
    /// Provider API key.
    pub api_key: String,
    /// Provider base URL.
    pub api_url: String,
    /// Model name requested from the provider.
    pub model: String,
}

impl Default for EmbeddingClientConfig {
    fn default() -> Self {
        Self {
            api_key: env_parse_with_default("EMBEDDING_API_KEY", String::new()),
            api_url: env_parse_with_default("EMBEDDING_API_URL", String::new()),
            model: env_parse_with_default("EMBEDDING_MODEL", "text-embedding-3-small".to_owned()),
        }
    }
}
