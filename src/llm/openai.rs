use super::CompletionProvider;
use crate::config::LlmConfig;
use crate::error::CompletionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest error body kept in a [`CompletionError::Api`]
const MAX_ERROR_BODY: usize = 500;

/// Client for OpenAI-compatible `/chat/completions` endpoints
pub struct OpenAiCompatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiCompatClient {
    /// Create a client for the configured endpoint and model
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("daily-changelog/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                CompletionError::Transport(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            endpoint: chat_endpoint(&config.base_url),
            api_key: api_key.into(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    async fn send_once(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(classify_status(status, &body));
        }
        parse_completion(&body)
    }
}

#[async_trait::async_trait]
impl CompletionProvider for OpenAiCompatClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let mut attempt = 0u32;
        loop {
            match self.send_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let backoff = Duration::from_secs(2u64.saturating_pow(attempt));
                    tracing::warn!(
                        "Completion attempt {} failed ({}), retrying in {:?}",
                        attempt,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// `https://host/v1` -> `https://host/v1/chat/completions`
fn chat_endpoint(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        base.to_string()
    } else {
        format!("{}/chat/completions", base)
    }
}

fn classify_status(status: u16, body: &str) -> CompletionError {
    match status {
        401 | 403 => CompletionError::Auth(status),
        429 => CompletionError::RateLimited,
        _ => CompletionError::Api {
            status,
            body: body.chars().take(MAX_ERROR_BODY).collect(),
        },
    }
}

fn parse_completion(body: &str) -> Result<String, CompletionError> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| CompletionError::Api {
        status: 200,
        body: format!("unparseable response: {}", e),
    })?;

    response
        .choices
        .into_iter()
        .find_map(|choice| choice.message.and_then(|m| m.content))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(CompletionError::EmptyResponse)
}
