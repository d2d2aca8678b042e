//! Emotional-state classification.
//!
//! A [`SentimentAnalyzer`] produces a free-form label/score signal;
//! [`classify_signal`] folds it into an [`EmotionalState`] with fixed rules.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use solace_core::types::EmotionalState;

use crate::backend::{SentimentAnalyzer, SentimentSignal};
use crate::error::BackendError;

/// `positive` must exceed this for the state to be calm.
pub const CALM_ABOVE: f64 = 0.7;

/// Map a sentiment signal to a state. Rules are checked in order.
pub fn classify_signal(signal: &SentimentSignal) -> EmotionalState {
    if signal.contains_key("anxiety") || signal.contains_key("anxious") {
        EmotionalState::Anxious
    } else if signal.contains_key("depression") || signal.contains_key("sad") {
        EmotionalState::Depressed
    } else if signal.contains_key("stress") {
        EmotionalState::Stressed
    } else if signal.get("positive").is_some_and(|score| *score > CALM_ABOVE) {
        EmotionalState::Calm
    } else {
        EmotionalState::Neutral
    }
}

// =============================================================================
// KeywordSentimentAnalyzer
// =============================================================================

struct Lexicon {
    key: &'static str,
    pattern: Regex,
}

static LEXICONS: LazyLock<Vec<Lexicon>> = LazyLock::new(|| {
    let mk = |key: &'static str, pat: &str| Lexicon {
        key,
        pattern: Regex::new(pat).expect("Invalid sentiment regex"),
    };

    vec![
        mk(
            "anxiety",
            r"(?i)\b(anxious|anxiety|worried|worry|worrying|nervous|panic|panicking|afraid|scared|on edge)\b",
        ),
        mk(
            "sad",
            r"(?i)\b(sad|depressed|depression|down|hopeless|empty|lonely|worthless|miserable|crying)\b",
        ),
        mk(
            "stress",
            r"(?i)\b(stress|stressed|stressful|overwhelmed|pressure|burned out|burnt out|exhausted|swamped)\b",
        ),
        mk(
            "positive",
            r"(?i)\b(good|great|happy|calm|relaxed|better|fine|grateful|peaceful|hopeful|glad|content)\b",
        ),
    ]
});

/// Offline analyzer that counts lexicon hits.
///
/// Each matching lexicon contributes its key with score `1 - 0.5^hits`, so
/// one hit scores 0.5 and two hits score 0.75. Lexicons with no hits are
/// omitted from the signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordSentimentAnalyzer;

impl KeywordSentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, text: &str) -> SentimentSignal {
        let mut signal = SentimentSignal::new();
        for lexicon in LEXICONS.iter() {
            let hits = lexicon.pattern.find_iter(text).count();
            if hits > 0 {
                let score = 1.0 - 0.5f64.powi(hits as i32);
                signal.insert(lexicon.key.to_string(), score);
            }
        }
        signal
    }
}

#[async_trait]
impl SentimentAnalyzer for KeywordSentimentAnalyzer {
    async fn analyze(&self, text: &str) -> Result<SentimentSignal, BackendError> {
        Ok(self.score(text))
    }
}
