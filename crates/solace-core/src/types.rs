//! Shared vocabulary used across the Solace crates.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// EmotionalState
// =============================================================================

/// Coarse emotional-state label attached to each conversation turn.
///
/// Used as an annotation only. Serialized as the lowercase variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalState {
    Anxious,
    Depressed,
    Stressed,
    Calm,
    Neutral,
    #[default]
    Unknown,
}

impl EmotionalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionalState::Anxious => "anxious",
            EmotionalState::Depressed => "depressed",
            EmotionalState::Stressed => "stressed",
            EmotionalState::Calm => "calm",
            EmotionalState::Neutral => "neutral",
            EmotionalState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EmotionalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionalState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anxious" => Ok(EmotionalState::Anxious),
            "depressed" => Ok(EmotionalState::Depressed),
            "stressed" => Ok(EmotionalState::Stressed),
            "calm" => Ok(EmotionalState::Calm),
            "neutral" => Ok(EmotionalState::Neutral),
            "unknown" => Ok(EmotionalState::Unknown),
            other => Err(format!("unknown emotional state: {}", other)),
        }
    }
}

// =============================================================================
// History
// =============================================================================

/// One prior exchange, rendered for a generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user: String,
    pub assistant: String,
}

impl HistoryEntry {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

/// Free-form per-session context mapping.
pub type SessionContext = HashMap<String, serde_json::Value>;
