//! Guarded access to external capabilities.
//!
//! Every backend call goes through [`CapabilityGuard`], which bounds it with
//! a timeout and converts failures into degraded values. Generation failures
//! never escape this module; embedding failures are returned to the caller.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use solace_core::types::{HistoryEntry, SessionContext};

use crate::backend::{ScoredGenerator, SentimentAnalyzer, SentimentSignal, TextGenerator};
use crate::embedding::DynEmbeddingService;
use crate::error::BackendError;
use crate::types::{CandidateSource, ResponseCandidate};

/// Confidence assigned to the unscored general backend.
pub const GENERAL_CONFIDENCE: f64 = 0.9;

/// Confidence of the canned reply used when the general backend fails.
pub const GENERAL_FALLBACK_CONFIDENCE: f64 = 0.5;

/// Canned reply used when the general backend fails.
pub const GENERAL_FALLBACK_TEXT: &str =
    "I'm here to listen and support you. Could you tell me more about what you're experiencing?";

/// Timeout-and-fallback wrapper around capability calls.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityGuard {
    timeout: Duration,
}

impl CapabilityGuard {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `fut` under the timeout. Elapsed time becomes `BackendError::Timeout`.
    pub async fn call<T, F>(&self, fut: F) -> Result<T, BackendError>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(self.timeout)),
        }
    }

    /// Ask the scored backend for a candidate.
    ///
    /// On failure: empty text, zero confidence.
    pub async fn scored_candidate(
        &self,
        backend: &dyn ScoredGenerator,
        message: &str,
        history: &[HistoryEntry],
    ) -> ResponseCandidate {
        match self.call(backend.generate(message, history)).await {
            Ok((text, confidence)) => {
                debug!(backend = backend.name(), confidence, "Scored candidate ready");
                ResponseCandidate::new(text, confidence, CandidateSource::ScoredModel)
            }
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "Scored backend failed");
                ResponseCandidate::new(String::new(), 0.0, CandidateSource::ScoredModel)
                    .with_reasoning(e.to_string())
            }
        }
    }

    /// Ask the general backend for a candidate.
    ///
    /// On failure: the canned fallback reply at reduced confidence.
    pub async fn general_candidate(
        &self,
        backend: &dyn TextGenerator,
        message: &str,
        history: &[HistoryEntry],
        context: &SessionContext,
    ) -> ResponseCandidate {
        match self.call(backend.generate(message, history, context)).await {
            Ok(text) => ResponseCandidate::new(text, GENERAL_CONFIDENCE, CandidateSource::GeneralModel),
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "General backend failed, using fallback reply");
                ResponseCandidate::new(
                    GENERAL_FALLBACK_TEXT,
                    GENERAL_FALLBACK_CONFIDENCE,
                    CandidateSource::GeneralFallback,
                )
                .with_reasoning(e.to_string())
            }
        }
    }

    /// Run the sentiment analyzer. `None` on failure.
    pub async fn sentiment(
        &self,
        analyzer: &dyn SentimentAnalyzer,
        text: &str,
    ) -> Option<SentimentSignal> {
        match self.call(analyzer.analyze(text)).await {
            Ok(signal) => Some(signal),
            Err(e) => {
                warn!(error = %e, "Sentiment analysis failed");
                None
            }
        }
    }

    /// Embed `text`. Failures are returned, not degraded.
    pub async fn embed(
        &self,
        service: &dyn DynEmbeddingService,
        text: &str,
    ) -> Result<Vec<f32>, BackendError> {
        self.call(service.embed_boxed(text)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedScored(Result<(String, f64), BackendError>);

    #[async_trait]
    impl ScoredGenerator for FixedScored {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(
            &self,
            _message: &str,
            _history: &[HistoryEntry],
        ) -> Result<(String, f64), BackendError> {
            self.0.clone()
        }
    }

    struct FixedText(Result<String, BackendError>);

    #[async_trait]
    impl TextGenerator for FixedText {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(
            &self,
            _message: &str,
            _history: &[HistoryEntry],
            _context: &SessionContext,
        ) -> Result<String, BackendError> {
            self.0.clone()
        }
    }

    struct SlowText;

    #[async_trait]
    impl TextGenerator for SlowText {
        fn name(&self) -> &str {
            "slow"
        }

        async fn generate(
            &self,
            _message: &str,
            _history: &[HistoryEntry],
            _context: &SessionContext,
        ) -> Result<String, BackendError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".to_string())
        }
    }

    struct FailingAnalyzer;

    #[async_trait]
    impl SentimentAnalyzer for FailingAnalyzer {
        async fn analyze(&self, _text: &str) -> Result<SentimentSignal, BackendError> {
            Err(BackendError::Unavailable("model offline".to_string()))
        }
    }

    fn guard() -> CapabilityGuard {
        CapabilityGuard::new(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_scored_success() {
        let backend = FixedScored(Ok(("Try a thought record.".to_string(), 0.82)));
        let c = guard().scored_candidate(&backend, "hi", &[]).await;
        assert_eq!(c.text, "Try a thought record.");
        assert_eq!(c.confidence, 0.82);
        assert_eq!(c.source, CandidateSource::ScoredModel);
        assert!(c.reasoning.is_none());
    }

    #[tokio::test]
    async fn test_scored_failure_degrades_to_empty() {
        let backend = FixedScored(Err(BackendError::Request("refused".to_string())));
        let c = guard().scored_candidate(&backend, "hi", &[]).await;
        assert_eq!(c.text, "");
        assert_eq!(c.confidence, 0.0);
        assert_eq!(c.source, CandidateSource::ScoredModel);
        assert!(c.reasoning.unwrap().contains("refused"));
    }

    #[tokio::test]
    async fn test_scored_confidence_clamped() {
        let backend = FixedScored(Ok(("text".to_string(), 3.0)));
        let c = guard().scored_candidate(&backend, "hi", &[]).await;
        assert_eq!(c.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_general_success_has_fixed_confidence() {
        let backend = FixedText(Ok("General reply".to_string()));
        let c = guard()
            .general_candidate(&backend, "hi", &[], &SessionContext::new())
            .await;
        assert_eq!(c.text, "General reply");
        assert_eq!(c.confidence, GENERAL_CONFIDENCE);
        assert_eq!(c.source, CandidateSource::GeneralModel);
    }

    #[tokio::test]
    async fn test_general_failure_uses_fallback() {
        let backend = FixedText(Err(BackendError::Http {
            status: 500,
            message: "boom".to_string(),
        }));
        let c = guard()
            .general_candidate(&backend, "hi", &[], &SessionContext::new())
            .await;
        assert_eq!(c.text, GENERAL_FALLBACK_TEXT);
        assert_eq!(c.confidence, GENERAL_FALLBACK_CONFIDENCE);
        assert_eq!(c.source, CandidateSource::GeneralFallback);
    }

    #[tokio::test(start_paused = true)]
    async fn test_general_timeout_uses_fallback() {
        let guard = CapabilityGuard::new(Duration::from_millis(100));
        let c = guard
            .general_candidate(&SlowText, "hi", &[], &SessionContext::new())
            .await;
        assert_eq!(c.source, CandidateSource::GeneralFallback);
        assert!(c.reasoning.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_sentiment_failure_is_none() {
        assert!(guard().sentiment(&FailingAnalyzer, "text").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_timeout_error() {
        let guard = CapabilityGuard::new(Duration::from_millis(10));
        let result: Result<(), BackendError> = guard
            .call(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(BackendError::Timeout(_))));
    }
}
