//! Data types for sessions, turns, and merge candidates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use solace_core::types::{EmotionalState, HistoryEntry, SessionContext};

// =============================================================================
// Turn
// =============================================================================

/// One recorded exchange. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub user_message: String,
    pub bot_response: String,
    pub timestamp: DateTime<Utc>,
    pub emotional_state: EmotionalState,
    /// Scored-candidate confidence observed for this reply, in [0, 1].
    pub confidence: f64,
}

impl Turn {
    pub fn new(
        user_message: impl Into<String>,
        bot_response: impl Into<String>,
        emotional_state: EmotionalState,
        confidence: f64,
    ) -> Self {
        Self {
            user_message: user_message.into(),
            bot_response: bot_response.into(),
            timestamp: Utc::now(),
            emotional_state,
            confidence: clamp_confidence(confidence),
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// State of one ongoing conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub owner_id: Option<String>,
    turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub context: SessionContext,
}

impl Session {
    /// Create an empty session with a fresh random id.
    pub fn new(owner_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            turns: Vec::new(),
            created_at: now,
            last_active: now,
            context: SessionContext::new(),
        }
    }

    /// Append a turn and bump `last_active`.
    ///
    /// `last_active` never moves backwards, even if the wall clock does.
    pub fn add_turn(&mut self, turn: Turn) {
        let stamp = turn.timestamp;
        self.turns.push(turn);
        if stamp > self.last_active {
            self.last_active = stamp;
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// The last `n` turns as user/assistant pairs, oldest first.
    pub fn recent_history(&self, n: usize) -> Vec<HistoryEntry> {
        let start = self.turns.len().saturating_sub(n);
        self.turns[start..]
            .iter()
            .map(|t| HistoryEntry::new(t.user_message.clone(), t.bot_response.clone()))
            .collect()
    }

    /// Whole minutes between creation and last activity.
    pub fn duration_minutes(&self) -> i64 {
        (self.last_active - self.created_at).num_seconds().max(0) / 60
    }
}

// =============================================================================
// ResponseCandidate
// =============================================================================

/// Which backend produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Domain-specific model that reports its own confidence.
    ScoredModel,
    /// Hosted general chat model.
    GeneralModel,
    /// Canned reply substituted after the general model failed.
    GeneralFallback,
}

/// A proposed reply, alive only for the duration of one merge.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseCandidate {
    pub text: String,
    pub confidence: f64,
    pub source: CandidateSource,
    pub reasoning: Option<String>,
}

impl ResponseCandidate {
    pub fn new(text: impl Into<String>, confidence: f64, source: CandidateSource) -> Self {
        Self {
            text: text.into(),
            confidence: clamp_confidence(confidence),
            source,
            reasoning: None,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }
}

/// Clamp into [0, 1]; NaN becomes 0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

// =============================================================================
// Results
// =============================================================================

/// Descriptive metadata about a final reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Length in characters.
    pub length: usize,
    pub word_count: usize,
    pub has_question: bool,
    pub embedding: Vec<f32>,
}

/// Outcome of processing one user message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResult {
    /// The session actually used. Differs from the requested id when that
    /// id was unknown.
    pub session_id: Uuid,
    pub response: String,
    pub emotional_state: EmotionalState,
    pub conversation_length: usize,
    pub metadata: ResponseMetadata,
}

/// Summary view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    /// ISO-8601.
    pub created_at: String,
    /// ISO-8601.
    pub last_active: String,
    pub message_count: usize,
    pub duration_minutes: i64,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            created_at: session.created_at.to_rfc3339(),
            last_active: session.last_active.to_rfc3339(),
            message_count: session.turn_count(),
            duration_minutes: session.duration_minutes(),
        }
    }
}

/// Export shape of one turn. Field names are a compatibility surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedTurn {
    /// ISO-8601.
    pub timestamp: String,
    pub user: String,
    pub assistant: String,
    pub emotional_state: EmotionalState,
}

impl From<&Turn> for ExportedTurn {
    fn from(turn: &Turn) -> Self {
        Self {
            timestamp: turn.timestamp.to_rfc3339(),
            user: turn.user_message.clone(),
            assistant: turn.bot_response.clone(),
            emotional_state: turn.emotional_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new(Some("user-1".to_string()));
        assert_ne!(session.id, Uuid::nil());
        assert_eq!(session.owner_id.as_deref(), Some("user-1"));
        assert_eq!(session.turn_count(), 0);
        assert_eq!(session.created_at, session.last_active);
        assert!(session.context.is_empty());
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        let a = Session::new(None);
        let b = Session::new(None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_add_turn_appends_in_order() {
        let mut session = Session::new(None);
        session.add_turn(Turn::new("Hello", "Hi there!", EmotionalState::Neutral, 0.9));
        session.add_turn(Turn::new("Bye", "Take care", EmotionalState::Calm, 0.4));
        assert_eq!(session.turn_count(), 2);
        assert_eq!(session.turns()[0].user_message, "Hello");
        assert_eq!(session.turns()[1].bot_response, "Take care");
    }

    #[test]
    fn test_add_turn_updates_last_active() {
        let mut session = Session::new(None);
        session.created_at -= Duration::minutes(10);
        session.last_active = session.created_at;
        session.add_turn(Turn::new("a", "b", EmotionalState::Unknown, 0.0));
        assert!(session.last_active > session.created_at);
    }

    #[test]
    fn test_last_active_never_moves_backwards() {
        let mut session = Session::new(None);
        let future = Utc::now() + Duration::hours(1);
        session.last_active = future;
        session.add_turn(Turn::new("a", "b", EmotionalState::Unknown, 0.0));
        assert_eq!(session.last_active, future);
    }

    #[test]
    fn test_recent_history_window() {
        let mut session = Session::new(None);
        for i in 0..7 {
            session.add_turn(Turn::new(
                format!("q{}", i),
                format!("a{}", i),
                EmotionalState::Unknown,
                0.0,
            ));
        }
        let history = session.recent_history(5);
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].user, "q2");
        assert_eq!(history[4].assistant, "a6");
    }

    #[test]
    fn test_recent_history_shorter_than_window() {
        let mut session = Session::new(None);
        session.add_turn(Turn::new("only", "one", EmotionalState::Unknown, 0.0));
        let history = session.recent_history(5);
        assert_eq!(history, vec![HistoryEntry::new("only", "one")]);
    }

    #[test]
    fn test_duration_minutes_floors() {
        let mut session = Session::new(None);
        session.last_active = session.created_at + Duration::seconds(179);
        assert_eq!(session.duration_minutes(), 2);
    }

    #[test]
    fn test_duration_counts_whole_days() {
        let mut session = Session::new(None);
        session.last_active = session.created_at + Duration::days(1) + Duration::minutes(5);
        assert_eq!(session.duration_minutes(), 24 * 60 + 5);
    }

    #[test]
    fn test_turn_confidence_is_clamped() {
        let turn = Turn::new("a", "b", EmotionalState::Unknown, 1.7);
        assert_eq!(turn.confidence, 1.0);
        let turn = Turn::new("a", "b", EmotionalState::Unknown, f64::NAN);
        assert_eq!(turn.confidence, 0.0);
    }

    #[test]
    fn test_candidate_confidence_is_clamped() {
        let c = ResponseCandidate::new("x", -0.5, CandidateSource::ScoredModel);
        assert_eq!(c.confidence, 0.0);
        let c = c.with_reasoning("negative score");
        assert_eq!(c.reasoning.as_deref(), Some("negative score"));
    }

    #[test]
    fn test_candidate_source_serialization() {
        let json = serde_json::to_string(&CandidateSource::GeneralFallback).unwrap();
        assert_eq!(json, "\"general_fallback\"");
    }

    #[test]
    fn test_summary_from_session() {
        let mut session = Session::new(None);
        session.add_turn(Turn::new("a", "b", EmotionalState::Unknown, 0.0));
        let summary = SessionSummary::from(&session);
        assert_eq!(summary.session_id, session.id);
        assert_eq!(summary.message_count, 1);
        assert_eq!(summary.duration_minutes, 0);
        assert!(DateTime::parse_from_rfc3339(&summary.created_at).is_ok());
    }

    #[test]
    fn test_exported_turn_shape() {
        let turn = Turn::new("I feel anxious", "Let's breathe", EmotionalState::Anxious, 0.8);
        let exported = ExportedTurn::from(&turn);
        let value = serde_json::to_value(&exported).unwrap();
        assert_eq!(value["user"], "I feel anxious");
        assert_eq!(value["assistant"], "Let's breathe");
        assert_eq!(value["emotional_state"], "anxious");
        assert!(value["timestamp"].as_str().is_some());
        assert_eq!(value.as_object().unwrap().len(), 4);
    }
}
