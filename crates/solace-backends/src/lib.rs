//! Concrete capability implementations for the Solace engine.
//!
//! - General backends: OpenAI-compatible chat completions, Gemini.
//! - Scored backends: HTTP model server, offline keyword rules.
//! - Embeddings: OpenAI-compatible `/embeddings`.

pub mod embedding;
pub mod gemini;
pub mod http;
pub mod openai;
pub mod prompt;
pub mod rules;
pub mod scored_http;

pub use embedding::OpenAiEmbeddingService;
pub use gemini::GeminiBackend;
pub use openai::OpenAiChatBackend;
pub use rules::{DisabledScoredModel, RuleBasedModel};
pub use scored_http::{clean_response, HttpScoredModel};
