//! OpenAI-compatible chat completions as the general backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use solace_chat::{BackendError, TextGenerator};
use solace_core::config::GeneralModelConfig;
use solace_core::types::{HistoryEntry, SessionContext};

use crate::http::{build_client, check_status, join_url, request_error};
use crate::prompt::{chat_messages, ChatMessage};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat-completions client.
#[derive(Debug, Clone)]
pub struct OpenAiChatBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiChatBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_client()?,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: 500,
        })
    }

    /// Build from config. Fails when no API key can be resolved.
    pub fn from_config(config: &GeneralModelConfig) -> Result<Self, BackendError> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| BackendError::Unavailable("OPENAI_API_KEY not set".to_string()))?;
        let mut backend = Self::new(api_key, config.model.clone())?
            .with_sampling(config.temperature, config.max_tokens);
        if !config.base_url.trim().is_empty() {
            backend = backend.with_base_url(config.base_url.clone());
        }
        Ok(backend)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenAiChatBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        message: &str,
        history: &[HistoryEntry],
        context: &SessionContext,
    ) -> Result<String, BackendError> {
        let body = CompletionRequest {
            model: &self.model,
            messages: chat_messages(message, history, context),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(join_url(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        let parsed: CompletionResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| BackendError::InvalidResponse("no message content".to_string()))?;

        debug!(model = %self.model, chars = content.len(), "Chat completion received");
        Ok(content)
    }
}
