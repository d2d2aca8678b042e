//! Builds the engine and its capabilities from configuration.

use std::sync::Arc;
use std::time::Duration;

use solace_backends::{
    DisabledScoredModel, GeminiBackend, HttpScoredModel, OpenAiChatBackend,
    OpenAiEmbeddingService, RuleBasedModel,
};
use solace_chat::{
    CapabilityGuard, ChatbotEngine, DynEmbeddingService, HybridResponseGenerator,
    KeywordSentimentAnalyzer, MergePolicy, MockEmbedding, ScoredGenerator, TextGenerator,
};
use solace_core::config::{
    env_var, EmbeddingConfig, EmbeddingProvider, GeneralModelConfig, GeneralProvider,
    ScoredProvider, SolaceConfig,
};
use solace_core::error::{Result, SolaceError};

pub fn build_engine(config: &SolaceConfig) -> Result<ChatbotEngine> {
    build_engine_with(config, env_var)
}

/// Build the engine, resolving missing API keys through `lookup`.
///
/// A hosted backend without a key is a configuration error.
pub fn build_engine_with(
    config: &SolaceConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ChatbotEngine> {
    let scored = scored_backend(config)?;
    let general = general_backend(config, &lookup)?;
    let embeddings = embedding_service(config, &lookup)?;

    let generator = HybridResponseGenerator::new(
        scored,
        general,
        embeddings,
        MergePolicy::new(config.engine.confidence_threshold),
        CapabilityGuard::new(Duration::from_secs(config.engine.backend_timeout_secs)),
    );

    let mut engine = ChatbotEngine::new(generator).with_history_turns(config.engine.history_turns);
    if config.sentiment.enabled {
        engine = engine.with_analyzer(Arc::new(KeywordSentimentAnalyzer::new()));
    }

    tracing::info!(
        scored = ?config.scored_model.provider,
        general = ?config.general_model.provider,
        embedding = ?config.embedding.provider,
        sentiment = config.sentiment.enabled,
        "Chatbot engine ready"
    );
    Ok(engine)
}

fn scored_backend(config: &SolaceConfig) -> Result<Arc<dyn ScoredGenerator>> {
    let backend: Arc<dyn ScoredGenerator> = match config.scored_model.provider {
        ScoredProvider::Rules => Arc::new(RuleBasedModel::new()),
        ScoredProvider::Http => Arc::new(HttpScoredModel::new(
            config.scored_model.endpoint.clone(),
        )?),
        ScoredProvider::None => Arc::new(DisabledScoredModel),
    };
    Ok(backend)
}

fn general_backend(
    config: &SolaceConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Arc<dyn TextGenerator>> {
    let Some(api_key) = config.general_model.resolve_api_key_with(lookup) else {
        return Err(SolaceError::Config(format!(
            "no API key for the general model; set general_model.api_key or {}",
            config.general_model.api_key_env()
        )));
    };
    let general = GeneralModelConfig {
        api_key,
        ..config.general_model.clone()
    };

    let backend: Arc<dyn TextGenerator> = match general.provider {
        GeneralProvider::Openai => Arc::new(OpenAiChatBackend::from_config(&general)?),
        GeneralProvider::Gemini => Arc::new(GeminiBackend::from_config(&general)?),
    };
    Ok(backend)
}

fn embedding_service(
    config: &SolaceConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Arc<dyn DynEmbeddingService>> {
    let service: Arc<dyn DynEmbeddingService> = match config.embedding.provider {
        EmbeddingProvider::Mock => Arc::new(MockEmbedding::with_dimensions(
            config.embedding.dimensions,
        )),
        EmbeddingProvider::Openai => {
            let Some(api_key) = config.embedding.resolve_api_key_with(lookup) else {
                return Err(SolaceError::Config(format!(
                    "no API key for embeddings; set embedding.api_key or {}",
                    config.embedding.api_key_env()
                )));
            };
            let embedding = EmbeddingConfig {
                api_key,
                ..config.embedding.clone()
            };
            Arc::new(OpenAiEmbeddingService::from_config(&embedding)?)
        }
    };
    Ok(service)
}
