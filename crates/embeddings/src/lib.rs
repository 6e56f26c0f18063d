//! Embedding Client: a deterministic contract over an external
//! vector-embedding provider.

mod client;
mod error;

pub use client::EmbeddingClient;
pub use error::EmbeddingError;
