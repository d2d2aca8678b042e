//! Offline scored backends.

use async_trait::async_trait;

use solace_chat::{BackendError, ScoredGenerator};
use solace_core::types::HistoryEntry;

const ANXIETY_WORDS: &[&str] = &["anxious", "anxiety", "worried", "nervous"];
const LOW_MOOD_WORDS: &[&str] = &["depressed", "sad", "down", "hopeless"];

const ANXIETY_REPLY: &str = "It sounds like you're experiencing anxiety. Let's work on identifying the thoughts behind these feelings. Can you tell me what specific worries are coming up?";
const LOW_MOOD_REPLY: &str = "I hear that you're feeling down. Depression can make everything feel harder. Let's explore what might be contributing to these feelings.";
const DEFAULT_REPLY: &str = "Thank you for sharing that with me. I'm here to listen and support you. Can you tell me more about what's been on your mind?";

/// Keyword model with fixed replies and confidences.
///
/// Matching is case-insensitive substring search; anxiety words win over
/// low-mood words.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedModel;

impl RuleBasedModel {
    pub fn new() -> Self {
        Self
    }

    pub fn respond(&self, message: &str) -> (&'static str, f64) {
        let lower = message.to_lowercase();
        if ANXIETY_WORDS.iter().any(|w| lower.contains(w)) {
            (ANXIETY_REPLY, 0.85)
        } else if LOW_MOOD_WORDS.iter().any(|w| lower.contains(w)) {
            (LOW_MOOD_REPLY, 0.80)
        } else {
            (DEFAULT_REPLY, 0.75)
        }
    }
}

#[async_trait]
impl ScoredGenerator for RuleBasedModel {
    fn name(&self) -> &str {
        "rules"
    }

    async fn generate(
        &self,
        message: &str,
        _history: &[HistoryEntry],
    ) -> Result<(String, f64), BackendError> {
        let (text, confidence) = self.respond(message);
        Ok((text.to_string(), confidence))
    }
}

/// Stand-in when no scored backend is configured. Always unavailable, so the
/// general backend's reply is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledScoredModel;

#[async_trait]
impl ScoredGenerator for DisabledScoredModel {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn generate(
        &self,
        _message: &str,
        _history: &[HistoryEntry],
    ) -> Result<(String, f64), BackendError> {
        Err(BackendError::Unavailable(
            "no scored model configured".to_string(),
        ))
    }
}
