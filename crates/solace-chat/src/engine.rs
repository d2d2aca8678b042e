//! Chatbot engine: session lifecycle and message processing.
//!
//! Resolves sessions, classifies emotional state, feeds the recent history
//! window into the [`HybridResponseGenerator`], and records each turn.

use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};
use uuid::Uuid;

use solace_core::types::EmotionalState;

use crate::backend::SentimentAnalyzer;
use crate::emotion::classify_signal;
use crate::error::ChatError;
use crate::merger::HybridResponseGenerator;
use crate::store::{SessionSlot, SessionStore};
use crate::types::{ExportedTurn, ProcessResult, Session, SessionSummary, Turn};

/// Number of prior turns passed to the backends by default.
pub const DEFAULT_HISTORY_TURNS: usize = 5;

/// Central coordinator for sessions and replies.
pub struct ChatbotEngine {
    store: SessionStore,
    generator: HybridResponseGenerator,
    analyzer: Option<Arc<dyn SentimentAnalyzer>>,
    history_turns: usize,
}

impl ChatbotEngine {
    /// Create an engine with no sentiment analyzer and the default history window.
    pub fn new(generator: HybridResponseGenerator) -> Self {
        Self {
            store: SessionStore::new(),
            generator,
            analyzer: None,
            history_turns: DEFAULT_HISTORY_TURNS,
        }
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn SentimentAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn history_turns(&self) -> usize {
        self.history_turns
    }

    // -------------------------------------------------------------------------
    // Session lifecycle
    // -------------------------------------------------------------------------

    /// Create an empty session and return its id.
    pub fn create_session(&self, owner_id: Option<String>) -> Result<Uuid, ChatError> {
        let session = Session::new(owner_id);
        let id = session.id;
        self.store.insert(session)?;
        info!(session_id = %id, "Session created");
        Ok(id)
    }

    /// Snapshot of a session, or `None` if unknown or ended.
    pub fn get_session(&self, session_id: &Uuid) -> Result<Option<Session>, ChatError> {
        self.store.get(session_id)
    }

    pub fn get_session_summary(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<SessionSummary>, ChatError> {
        Ok(self
            .store
            .get(session_id)?
            .map(|session| SessionSummary::from(&session)))
    }

    /// Turns in chronological order.
    pub fn get_conversation_export(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<Vec<ExportedTurn>>, ChatError> {
        Ok(self
            .store
            .get(session_id)?
            .map(|session| session.turns().iter().map(ExportedTurn::from).collect()))
    }

    /// Remove a session. `false` if it did not exist.
    pub fn end_session(&self, session_id: &Uuid) -> Result<bool, ChatError> {
        let removed = self.store.remove(session_id)?;
        if removed {
            info!(session_id = %session_id, "Session ended");
        }
        Ok(removed)
    }

    /// Set one context entry. `false` if the session does not exist.
    pub fn set_context_value(
        &self,
        session_id: &Uuid,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<bool, ChatError> {
        let key = key.into();
        let updated = self
            .store
            .with_session(session_id, |session| {
                session.context.insert(key, value);
            })?
            .is_some();
        Ok(updated)
    }

    pub fn session_count(&self) -> Result<usize, ChatError> {
        self.store.len()
    }

    // -------------------------------------------------------------------------
    // Message processing
    // -------------------------------------------------------------------------

    /// Process one user message.
    ///
    /// An unknown or absent `session_id` starts a new session; the id actually
    /// used is returned in the result. If the session is ended while its reply
    /// is being generated, the reply is discarded with
    /// [`ChatError::SessionEnded`].
    pub async fn process_message(
        &self,
        session_id: Option<Uuid>,
        message: &str,
    ) -> Result<ProcessResult, ChatError> {
        self.process_message_as(session_id, message, None).await
    }

    /// Like [`process_message`](Self::process_message), recording `owner_id`
    /// on any session created along the way.
    pub async fn process_message_as(
        &self,
        session_id: Option<Uuid>,
        message: &str,
        owner_id: Option<String>,
    ) -> Result<ProcessResult, ChatError> {
        let (slot, gate) = self.acquire_live_slot(session_id, owner_id).await?;

        let (id, history, context) = {
            let session = slot.state()?;
            (
                session.id,
                session.recent_history(self.history_turns),
                session.context.clone(),
            )
        };

        let emotional_state = self.classify(message).await;
        let merged = self
            .generator
            .generate_response(message, &history, &context)
            .await?;

        let conversation_length = {
            let mut session = slot.state()?;
            if slot.is_ended() {
                warn!(session_id = %id, "Session ended mid-message, reply discarded");
                return Err(ChatError::SessionEnded(id));
            }
            session.add_turn(Turn::new(
                message,
                merged.text.clone(),
                emotional_state,
                merged.scored_confidence,
            ));
            session.turn_count()
        };
        drop(gate);

        debug!(
            session_id = %id,
            conversation_length,
            emotional_state = %emotional_state,
            "Turn recorded"
        );

        let metadata = self.generator.response_metadata(&merged.text).await;

        Ok(ProcessResult {
            session_id: id,
            response: merged.text,
            emotional_state,
            conversation_length,
            metadata,
        })
    }

    /// Resolve the session and wait for its gate. A session ended while we
    /// waited is treated like an unknown id.
    async fn acquire_live_slot(
        &self,
        session_id: Option<Uuid>,
        owner_id: Option<String>,
    ) -> Result<(Arc<SessionSlot>, OwnedMutexGuard<()>), ChatError> {
        let slot = self.resolve_slot(session_id, owner_id.clone())?;
        let gate = slot.acquire().await;
        if !slot.is_ended() {
            return Ok((slot, gate));
        }
        drop(gate);

        let session = Session::new(owner_id);
        info!(
            requested = ?session_id,
            session_id = %session.id,
            "Session ended while waiting, starting a new one"
        );
        let slot = self.store.insert(session)?;
        let gate = slot.acquire().await;
        Ok((slot, gate))
    }

    fn resolve_slot(
        &self,
        session_id: Option<Uuid>,
        owner_id: Option<String>,
    ) -> Result<Arc<SessionSlot>, ChatError> {
        if let Some(id) = session_id {
            if let Some(slot) = self.store.slot(&id)? {
                return Ok(slot);
            }
            info!(requested = %id, "Unknown session, starting a new one");
        }

        let session = Session::new(owner_id);
        info!(session_id = %session.id, "Session created");
        self.store.insert(session)
    }

    async fn classify(&self, message: &str) -> EmotionalState {
        let Some(analyzer) = &self.analyzer else {
            return EmotionalState::Unknown;
        };
        match self
            .generator
            .guard()
            .sentiment(analyzer.as_ref(), message)
            .await
        {
            Some(signal) => classify_signal(&signal),
            None => EmotionalState::Unknown,
        }
    }
}
