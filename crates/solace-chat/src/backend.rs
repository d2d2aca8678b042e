//! Capability traits for the external collaborators of the engine.
//!
//! Implementations live in `solace-backends`; tests use in-crate stubs.

use std::collections::HashMap;

use async_trait::async_trait;

use solace_core::types::{HistoryEntry, SessionContext};

use crate::error::BackendError;

/// A generation backend that reports its own confidence.
#[async_trait]
pub trait ScoredGenerator: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Produce a reply and a confidence score in [0, 1].
    async fn generate(
        &self,
        message: &str,
        history: &[HistoryEntry],
    ) -> Result<(String, f64), BackendError>;
}

/// A generation backend without a confidence signal.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    async fn generate(
        &self,
        message: &str,
        history: &[HistoryEntry],
        context: &SessionContext,
    ) -> Result<String, BackendError>;
}

/// Free-form sentiment signal: label to score.
pub type SentimentSignal = HashMap<String, f64>;

/// Maps free text to a sentiment signal.
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<SentimentSignal, BackendError>;
}
