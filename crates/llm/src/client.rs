//! Minimal LLM client used by the Cleanup Scheduler's refined-similarity
//! step. Speaks an OpenAI-compatible chat-completions API.

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Default model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Client for LLM chat-completion calls.
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl LlmClient {
    /// Creates a new LLM client with the given API key and base URL.
    #[must_use]
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model: DEFAULT_MODEL.to_owned(),
            max_tokens: 32,
            temperature: 0.0,
        }
    }

    /// Sets a custom model for this client.
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Sets `max_tokens` and `temperature` for subsequent calls.
    #[must_use]
    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Asks the LLM to refine a pair of near-duplicate messages' similarity
    /// into a single `[0, 1]` score, used when the Levenshtein-based score
    /// falls below the duplicate threshold. Returns a value clamped to
    /// `[0, 1]`.
    pub async fn refine_similarity(&self, a: &str, b: &str) -> Result<f64, LlmError> {
        let prompt = format!(
            "Rate how likely these two application error messages describe the same \
             underlying issue, on a scale from 0.0 (unrelated) to 1.0 (same issue). \
             Respond with only the number.\n\nMessage A: {}\nMessage B: {}",
            truncate(a, 1000),
            truncate(b, 1000)
        );

        let request = ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![ChatMessage { role: "user", content: &prompt }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::HttpStatus { code: status.as_u16(), body: truncate(&body, 500) });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed.choices.first().ok_or(LlmError::EmptyResponse)?.message.content.trim();
        parse_score(content).ok_or(LlmError::UnparseableScore)
    }
}

fn parse_score(text: &str) -> Option<f64> {
    let numeric: String =
        text.chars().filter(|c| c.is_ascii_digit() || *c == '.').take(10).collect();
    numeric.parse::<f64>().ok().map(|score| score.clamp(0.0, 1.0))
}

/// Truncates a string to the given maximum length at a char boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        s.get(..end).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn refine_similarity_parses_numeric_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "0.92"}}]
            })))
            .mount(&server)
            .await;

        let client = LlmClient::new("key".to_owned(), server.uri());
        let score = client.refine_similarity("NPE at Foo.bar", "NullPointerException in Foo.bar").await.unwrap();
        assert!((score - 0.92).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_score_clamps_out_of_range_values() {
        assert_eq!(parse_score("1.5"), Some(1.0));
        assert_eq!(parse_score("not a number"), None);
    }
}
