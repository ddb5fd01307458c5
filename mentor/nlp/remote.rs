use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{
    config::RemoteSettings,
    generation::{GenerationError, GenerationPrompt, TextGenerator},
};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Client for OpenAI-compatible chat completion endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiChatGenerator {
    client: reqwest::Client,
    settings: RemoteSettings,
    api_key: String,
}

impl OpenAiChatGenerator {
    /// Builds a client, reading the API key from `settings.api_key_env`.
    pub fn from_env(settings: RemoteSettings) -> Result<Self, GenerationError> {
        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GenerationError::MissingApiKey(settings.api_key_env.clone()))?;
        Self::new(settings, api_key)
    }

    /// Builds a client with an explicit API key.
    pub fn new(settings: RemoteSettings, api_key: impl Into<String>) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|err| GenerationError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            settings,
            api_key: api_key.into(),
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a GenerationPrompt) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.settings.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }
}

fn extract_reply(body: &str) -> Result<String, GenerationError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|err| GenerationError::MalformedResponse(err.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(GenerationError::EmptyResponse)
}

#[async_trait]
impl TextGenerator for OpenAiChatGenerator {
    fn name(&self) -> &str {
        &self.settings.model
    }

    async fn generate(&self, prompt: &GenerationPrompt) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|err| GenerationError::Transport(err.to_string()))?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationError::RateLimited);
        }
        let body = response
            .text()
            .await
            .map_err(|err| GenerationError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(GenerationError::Transport(format!("HTTP {status}: {body}")));
        }
        extract_reply(&body)
    }
}
