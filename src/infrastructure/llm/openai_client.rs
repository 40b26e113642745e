use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{Completion, CompletionClient, CompletionError, Turn};
use crate::presentation::config::LlmSettings;

/// Chat-completions client speaking the OpenAI wire format.
pub struct OpenAiCompletionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}

impl OpenAiCompletionClient {
    pub fn new(settings: &LlmSettings) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    #[tracing::instrument(skip(self, turns), fields(model = %self.model, turns = turns.len(), max_tokens))]
    async fn complete(
        &self,
        turns: &[Turn],
        max_tokens: u32,
    ) -> Result<Completion, CompletionError> {
        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: turns
                .iter()
                .map(|turn| WireMessage {
                    role: turn.role.wire_str().to_string(),
                    content: turn.content.clone(),
                })
                .collect(),
            max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout
                } else {
                    CompletionError::Provider(e.to_string())
                }
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CompletionError::RateLimited);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Provider(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        let tokens_used = completion
            .usage
            .as_ref()
            .map(|u| u.total_tokens)
            .unwrap_or_default();

        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::InvalidResponse("empty choices".to_string()))?;

        Ok(Completion {
            text,
            tokens_used,
            model: self.model.clone(),
        })
    }
}
