//! OpenAI-compatible embeddings endpoint.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use solace_chat::{BackendError, EmbeddingService};
use solace_core::config::EmbeddingConfig;

use crate::http::{build_client, check_status, join_url, request_error};
use crate::openai::DEFAULT_OPENAI_BASE_URL;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingService {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbeddingService {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_client()?,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            dimensions,
        })
    }

    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, BackendError> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| BackendError::Unavailable("OPENAI_API_KEY not set".to_string()))?;
        let mut service = Self::new(api_key, config.model.clone(), config.dimensions)?;
        if !config.base_url.trim().is_empty() {
            service = service.with_base_url(config.base_url.clone());
        }
        Ok(service)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl EmbeddingService for OpenAiEmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: text,
            dimensions: self.dimensions,
        };

        let response = self
            .client
            .post(join_url(&self.base_url, "embeddings"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        let parsed: EmbeddingResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| BackendError::InvalidResponse("no embedding in response".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
