//! Gemini generateContent as the general backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use solace_chat::{BackendError, TextGenerator};
use solace_core::config::GeneralModelConfig;
use solace_core::types::{HistoryEntry, SessionContext};

use crate::http::{build_client, check_status, join_url, request_error};
use crate::prompt::gemini_prompt;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_client()?,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Build from config. An OpenAI model name in the config falls back to
    /// the default Gemini model.
    pub fn from_config(config: &GeneralModelConfig) -> Result<Self, BackendError> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| BackendError::Unavailable("GEMINI_API_KEY not set".to_string()))?;
        let model = if config.model.starts_with("gemini") {
            config.model.clone()
        } else {
            DEFAULT_GEMINI_MODEL.to_string()
        };
        let mut backend = Self::new(api_key, model)?;
        if !config.base_url.trim().is_empty() {
            backend = backend.with_base_url(config.base_url.clone());
        }
        Ok(backend)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        message: &str,
        history: &[HistoryEntry],
        context: &SessionContext,
    ) -> Result<String, BackendError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: gemini_prompt(message, history, context),
                }],
            }],
        };

        let url = join_url(
            &self.base_url,
            &format!("models/{}:generateContent", self.model),
        );
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        let parsed: GenerateResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(BackendError::InvalidResponse("empty candidate".to_string()));
        }

        debug!(model = %self.model, chars = text.len(), "Gemini reply received");
        Ok(text)
    }
}
