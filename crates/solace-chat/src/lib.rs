//! Conversational core for Solace.
//!
//! Routes user messages through two generation backends, merges the
//! candidate replies into one response, and tracks per-session state.

pub mod backend;
pub mod capability;
pub mod embedding;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod merger;
pub mod store;
pub mod types;

pub use backend::{ScoredGenerator, SentimentAnalyzer, SentimentSignal, TextGenerator};
pub use capability::CapabilityGuard;
pub use embedding::{cosine_similarity, DynEmbeddingService, EmbeddingService, MockEmbedding};
pub use emotion::{classify_signal, KeywordSentimentAnalyzer};
pub use engine::ChatbotEngine;
pub use error::{BackendError, ChatError};
pub use merger::{HybridResponseGenerator, MergePolicy, MergeRoute, MergedResponse};
pub use store::SessionStore;
pub use types::{
    CandidateSource, ExportedTurn, ProcessResult, ResponseCandidate, ResponseMetadata, Session,
    SessionSummary, Turn,
};
