use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SolaceError};

/// Top-level configuration for the Solace application.
///
/// Loaded from `~/.solace/config.toml` by default. Each section corresponds
/// to one collaborator of the chatbot engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolaceConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub scored_model: ScoredModelConfig,
    #[serde(default)]
    pub general_model: GeneralModelConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
}

impl SolaceConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SolaceConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.engine.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(SolaceError::Config(format!(
                "engine.confidence_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if self.engine.history_turns == 0 {
            return Err(SolaceError::Config(
                "engine.history_turns must be at least 1".to_string(),
            ));
        }
        if self.engine.backend_timeout_secs == 0 {
            return Err(SolaceError::Config(
                "engine.backend_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.engine.max_message_length == 0 {
            return Err(SolaceError::Config(
                "engine.max_message_length must be at least 1".to_string(),
            ));
        }
        if self.scored_model.provider == ScoredProvider::Http
            && self.scored_model.endpoint.trim().is_empty()
        {
            return Err(SolaceError::Config(
                "scored_model.endpoint is required when provider = \"http\"".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Chatbot engine and response merger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of most recent turns passed to the backends as history.
    pub history_turns: usize,
    /// Scored-candidate confidence at or above which replies are blended.
    pub confidence_threshold: f64,
    /// Upper bound on any single backend call, in seconds.
    pub backend_timeout_secs: u64,
    /// Maximum accepted user message length in characters.
    pub max_message_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_turns: 5,
            confidence_threshold: 0.7,
            backend_timeout_secs: 30,
            max_message_length: 2000,
        }
    }
}

/// Which implementation serves the confidence-scored candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoredProvider {
    /// Offline keyword model.
    Rules,
    /// Model server reached over HTTP.
    Http,
    /// No scored backend; every call yields a zero-confidence candidate.
    None,
}

/// Scored (domain-specific) model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoredModelConfig {
    pub provider: ScoredProvider,
    /// Generation endpoint of the model server (provider = "http").
    pub endpoint: String,
}

impl Default for ScoredModelConfig {
    fn default() -> Self {
        Self {
            provider: ScoredProvider::Rules,
            endpoint: String::new(),
        }
    }
}

/// Which hosted API serves the unscored general candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneralProvider {
    Openai,
    Gemini,
}

/// General (hosted chat) model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralModelConfig {
    pub provider: GeneralProvider,
    pub model: String,
    /// API key. Falls back to `OPENAI_API_KEY` / `GEMINI_API_KEY` when empty.
    pub api_key: String,
    /// Override for OpenAI-compatible servers. Empty means the provider default.
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GeneralModelConfig {
    fn default() -> Self {
        Self {
            provider: GeneralProvider::Openai,
            model: "gpt-4-turbo-preview".to_string(),
            api_key: String::new(),
            base_url: String::new(),
            temperature: 0.7,
            max_tokens: 500,
        }
    }
}

impl GeneralModelConfig {
    /// Environment variable consulted when `api_key` is empty.
    pub fn api_key_env(&self) -> &'static str {
        match self.provider {
            GeneralProvider::Openai => "OPENAI_API_KEY",
            GeneralProvider::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Resolve the API key: config value first, then the provider's env var.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(env_var)
    }

    /// Like [`resolve_api_key`](Self::resolve_api_key), reading variables
    /// through `lookup`.
    pub fn resolve_api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        key_or_lookup(&self.api_key, self.api_key_env(), lookup)
    }
}

/// Which implementation computes text embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Deterministic hash-based vectors.
    Mock,
    /// OpenAI-compatible `/embeddings` endpoint.
    Openai,
}

/// Embedding service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimensions: usize,
    pub api_key: String,
    pub base_url: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Mock,
            model: "text-embedding-3-small".to_string(),
            dimensions: 384,
            api_key: String::new(),
            base_url: String::new(),
        }
    }
}

impl EmbeddingConfig {
    pub fn api_key_env(&self) -> &'static str {
        "OPENAI_API_KEY"
    }

    /// Resolve the API key: config value first, then `OPENAI_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(env_var)
    }

    pub fn resolve_api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        key_or_lookup(&self.api_key, self.api_key_env(), lookup)
    }
}

/// Process environment lookup used by the `resolve_api_key` helpers.
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn key_or_lookup(
    configured: &str,
    var: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    if !configured.trim().is_empty() {
        return Some(configured.to_string());
    }
    lookup(var).filter(|k| !k.trim().is_empty())
}

/// Emotional-state classification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Attach the keyword sentiment analyzer to the engine.
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = SolaceConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.engine.history_turns, 5);
        assert_eq!(config.engine.confidence_threshold, 0.7);
        assert_eq!(config.engine.max_message_length, 2000);
        assert_eq!(config.scored_model.provider, ScoredProvider::Rules);
        assert_eq!(config.general_model.provider, GeneralProvider::Openai);
        assert_eq!(config.general_model.max_tokens, 500);
        assert_eq!(config.embedding.provider, EmbeddingProvider::Mock);
        assert!(!config.sentiment.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[server]
port = 9100

[engine]
confidence_threshold = 0.6
history_turns = 3

[scored_model]
provider = "http"
endpoint = "http://127.0.0.1:5005/generate"

[general_model]
provider = "gemini"
model = "gemini-2.0-flash"

[sentiment]
enabled = true
"#;
        let file = create_temp_config(content);
        let config = SolaceConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.engine.confidence_threshold, 0.6);
        assert_eq!(config.engine.history_turns, 3);
        assert_eq!(config.engine.backend_timeout_secs, 30);
        assert_eq!(config.scored_model.provider, ScoredProvider::Http);
        assert_eq!(config.general_model.provider, GeneralProvider::Gemini);
        assert_eq!(config.general_model.model, "gemini-2.0-flash");
        assert!(config.sentiment.enabled);
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let file = create_temp_config("");
        let config = SolaceConfig::load(file.path()).unwrap();
        assert_eq!(config.engine.history_turns, 5);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("engine = [[[");
        let err = SolaceConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, SolaceError::Config(_)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = SolaceConfig::load(Path::new("/nonexistent/solace.toml")).unwrap_err();
        assert!(matches!(err, SolaceError::Io(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = SolaceConfig::load_or_default(Path::new("/nonexistent/solace.toml"));
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_load_rejects_out_of_range_threshold() {
        let file = create_temp_config("[engine]\nconfidence_threshold = 1.5\n");
        let err = SolaceConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("confidence_threshold"));
    }

    #[test]
    fn test_validate_rejects_zero_history() {
        let mut config = SolaceConfig::default();
        config.engine.history_turns = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = SolaceConfig::default();
        config.engine.backend_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_http_provider_needs_endpoint() {
        let mut config = SolaceConfig::default();
        config.scored_model.provider = ScoredProvider::Http;
        assert!(config.validate().is_err());
        config.scored_model.endpoint = "http://localhost:5005/generate".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = SolaceConfig::default();
        config.server.port = 9999;
        config.general_model.provider = GeneralProvider::Gemini;
        config.save(&path).unwrap();

        let reloaded = SolaceConfig::load(&path).unwrap();
        assert_eq!(reloaded.server.port, 9999);
        assert_eq!(reloaded.general_model.provider, GeneralProvider::Gemini);
    }

    #[test]
    fn test_resolve_api_key_prefers_config_value() {
        let config = GeneralModelConfig {
            api_key: "sk-from-config".to_string(),
            ..GeneralModelConfig::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-from-config"));
    }

    #[test]
    fn test_resolve_api_key_reads_provider_variable() {
        let config = GeneralModelConfig {
            provider: GeneralProvider::Gemini,
            ..GeneralModelConfig::default()
        };
        let lookup = |var: &str| (var == "GEMINI_API_KEY").then(|| "g-key".to_string());
        assert_eq!(config.resolve_api_key_with(lookup).as_deref(), Some("g-key"));
        assert_eq!(config.resolve_api_key_with(|_| Some("  ".to_string())), None);
        assert_eq!(config.resolve_api_key_with(|_| None), None);
    }
}
