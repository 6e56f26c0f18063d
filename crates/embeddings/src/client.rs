//! Deterministic contract over an external vector-embedding provider.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Calls `embed(text) -> vector` against an external HTTP provider.
/// Callers are agnostic to which provider is behind `base_url`.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl EmbeddingClient {
    /// Creates a client bound to `base_url`, authenticating with `api_key`
    /// and requesting embeddings from `model`. `timeout` bounds every call.
    #[must_use]
    pub fn new(base_url: String, api_key: String, model: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, base_url, api_key, model }
    }

    /// Computes the embedding for `text`.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&EmbedRequest { model: &self.model, input: text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::HttpStatus { code: status.as_u16(), body: truncate(&body) });
        }

        let parsed: EmbedResponse = response.json().await.map_err(EmbeddingError::HttpRequest)?;
        if parsed.embedding.is_empty() {
            return Err(EmbeddingError::MissingVector);
        }
        Ok(parsed.embedding)
    }
}

fn truncate(s: &str) -> String {
    const MAX: usize = 500;
    if s.len() <= MAX { s.to_owned() } else { format!("{}...", &s[..MAX]) }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn embed_parses_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": [0.1, 0.2, 0.3]
            })))
            .mount(&server)
            .await;

        let client = EmbeddingClient::new(
            server.uri(),
            "key".to_owned(),
            "test-model".to_owned(),
            Duration::from_secs(5),
        );
        let embedding = client.embed("hello").await.unwrap();
        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn embed_surfaces_http_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = EmbeddingClient::new(
            server.uri(),
            "key".to_owned(),
            "test-model".to_owned(),
            Duration::from_secs(5),
        );
        let err = client.embed("hello").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn embed_rejects_empty_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"embedding": []})),
            )
            .mount(&server)
            .await;

        let client = EmbeddingClient::new(
            server.uri(),
            "key".to_owned(),
            "test-model".to_owned(),
            Duration::from_secs(5),
        );
        assert!(matches!(client.embed("hello").await, Err(EmbeddingError::MissingVector)));
    }
}
