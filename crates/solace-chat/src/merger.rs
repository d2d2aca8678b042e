//! Hybrid response merging.
//!
//! Two candidates are produced for every message: one from a backend that
//! scores its own confidence, one from a general backend that does not.
//! [`MergePolicy`] decides which text (or which combination) is returned.

use std::sync::Arc;

use tracing::{debug, warn};

use solace_core::types::{HistoryEntry, SessionContext};

use crate::backend::{ScoredGenerator, TextGenerator};
use crate::capability::CapabilityGuard;
use crate::embedding::{cosine_similarity, DynEmbeddingService};
use crate::error::ChatError;
use crate::types::{clamp_confidence, ResponseCandidate, ResponseMetadata};

/// Scored candidates below this confidence are ignored.
pub const UNRELIABLE_BELOW: f64 = 0.3;

/// Similarity above which two candidates count as near-duplicates.
pub const NEAR_DUPLICATE_ABOVE: f64 = 0.85;

/// Near-duplicates keep the scored text only above this confidence.
pub const PREFER_SCORED_ABOVE: f64 = 0.8;

/// Divergent scored text is appended only when longer than this (chars).
pub const MIN_APPENDED_CHARS: usize = 50;

/// Default threshold at which the scored candidate may contribute.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

// =============================================================================
// MergePolicy
// =============================================================================

/// Which branch of the policy a scored confidence falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRoute {
    /// Scored candidate is unreliable; the general text wins outright.
    Unreliable,
    /// Scored candidate is usable but not strong enough to blend.
    BelowThreshold,
    /// Scored candidate is strong enough; similarity decides.
    Hybrid,
}

/// Pure threshold/similarity policy. Holds no backends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergePolicy {
    confidence_threshold: f64,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl MergePolicy {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold: clamp_confidence(confidence_threshold),
        }
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    /// Classify a scored confidence.
    pub fn route(&self, scored_confidence: f64) -> MergeRoute {
        if scored_confidence < UNRELIABLE_BELOW {
            MergeRoute::Unreliable
        } else if scored_confidence >= self.confidence_threshold {
            MergeRoute::Hybrid
        } else {
            MergeRoute::BelowThreshold
        }
    }

    /// Hybrid branch: combine the two texts given their embedding similarity.
    pub fn blend(
        &self,
        scored: &ResponseCandidate,
        general: &ResponseCandidate,
        similarity: f64,
    ) -> String {
        if similarity > NEAR_DUPLICATE_ABOVE {
            if scored.confidence > PREFER_SCORED_ABOVE {
                scored.text.clone()
            } else {
                general.text.clone()
            }
        } else if scored.text.chars().count() > MIN_APPENDED_CHARS {
            format!("{}\n\n{}", general.text, scored.text)
        } else {
            general.text.clone()
        }
    }
}

// =============================================================================
// HybridResponseGenerator
// =============================================================================

/// Final reply of one merge, plus the scored confidence that was observed.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedResponse {
    pub text: String,
    pub scored_confidence: f64,
}

/// Queries both backends and merges their candidates.
pub struct HybridResponseGenerator {
    scored: Arc<dyn ScoredGenerator>,
    general: Arc<dyn TextGenerator>,
    embeddings: Arc<dyn DynEmbeddingService>,
    policy: MergePolicy,
    guard: CapabilityGuard,
}

impl HybridResponseGenerator {
    pub fn new(
        scored: Arc<dyn ScoredGenerator>,
        general: Arc<dyn TextGenerator>,
        embeddings: Arc<dyn DynEmbeddingService>,
        policy: MergePolicy,
        guard: CapabilityGuard,
    ) -> Self {
        Self {
            scored,
            general,
            embeddings,
            policy,
            guard,
        }
    }

    pub fn policy(&self) -> &MergePolicy {
        &self.policy
    }

    pub fn guard(&self) -> &CapabilityGuard {
        &self.guard
    }

    /// Produce the final reply for `message`.
    ///
    /// Backend failures are absorbed into degraded candidates. Only an
    /// embedding failure in the hybrid branch is returned as an error.
    pub async fn generate_response(
        &self,
        message: &str,
        history: &[HistoryEntry],
        context: &SessionContext,
    ) -> Result<MergedResponse, ChatError> {
        let (scored, general) = tokio::join!(
            self.guard
                .scored_candidate(self.scored.as_ref(), message, history),
            self.guard
                .general_candidate(self.general.as_ref(), message, history, context),
        );

        let route = self.policy.route(scored.confidence);
        let text = match route {
            MergeRoute::Unreliable | MergeRoute::BelowThreshold => general.text.clone(),
            MergeRoute::Hybrid => {
                let similarity = self.similarity(&scored.text, &general.text).await?;
                debug!(similarity, "Computed candidate similarity");
                self.policy.blend(&scored, &general, similarity)
            }
        };

        debug!(
            ?route,
            scored_confidence = scored.confidence,
            general_source = ?general.source,
            "Merged response"
        );

        Ok(MergedResponse {
            text,
            scored_confidence: scored.confidence,
        })
    }

    /// Describe a final reply. Embedding failure yields an empty vector.
    pub async fn response_metadata(&self, text: &str) -> ResponseMetadata {
        let embedding = match self.guard.embed(self.embeddings.as_ref(), text).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Embedding for response metadata failed");
                Vec::new()
            }
        };

        ResponseMetadata {
            length: text.chars().count(),
            word_count: text.split_whitespace().count(),
            has_question: text.contains('?'),
            embedding,
        }
    }

    async fn similarity(&self, a: &str, b: &str) -> Result<f64, ChatError> {
        let (va, vb) = tokio::try_join!(
            self.guard.embed(self.embeddings.as_ref(), a),
            self.guard.embed(self.embeddings.as_ref(), b),
        )
        .map_err(ChatError::Embedding)?;
        Ok(cosine_similarity(&va, &vb))
    }
}
