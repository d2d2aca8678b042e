//! In-memory session store with per-session serialization.
//!
//! Each session lives in its own [`SessionSlot`]. The slot's `gate` is held
//! for the full processing of one message so turns for the same session are
//! appended in submission order; the `state` mutex is only held while the
//! session is read or mutated. Different sessions never contend beyond the
//! short map lookup.
//!
//! Removing a session marks its slot as ended under the state lock, so a
//! message still in flight for that session can see the removal before it
//! appends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::ChatError;
use crate::types::Session;

/// One session plus its processing gate.
#[derive(Debug)]
pub struct SessionSlot {
    gate: Arc<AsyncMutex<()>>,
    state: Mutex<Session>,
    ended: AtomicBool,
}

impl SessionSlot {
    fn new(session: Session) -> Self {
        Self {
            gate: Arc::new(AsyncMutex::new(())),
            state: Mutex::new(session),
            ended: AtomicBool::new(false),
        }
    }

    /// Wait for exclusive processing rights on this session. FIFO.
    ///
    /// The engine holds the gate for a whole message, backend calls included,
    /// so a slow or timing-out backend delays every later message on the same
    /// session by up to the configured backend timeouts. Other sessions are
    /// unaffected.
    pub async fn acquire(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.gate).lock_owned().await
    }

    /// Whether the session was removed from its store.
    ///
    /// Check while holding [`state`](Self::state) to order against removal.
    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }

    fn mark_ended(&self) -> Result<(), ChatError> {
        let _state = self.state()?;
        self.ended.store(true, Ordering::Release);
        Ok(())
    }

    /// Lock the session state. Do not hold across an await.
    pub fn state(&self) -> Result<MutexGuard<'_, Session>, ChatError> {
        self.state
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))
    }
}

/// Owner of every live session, keyed by id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<SessionSlot>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `session` and return its slot.
    pub fn insert(&self, session: Session) -> Result<Arc<SessionSlot>, ChatError> {
        let id = session.id;
        let slot = Arc::new(SessionSlot::new(session));
        self.sessions
            .write()
            .map_err(|e| ChatError::StorageError(format!("store lock poisoned: {}", e)))?
            .insert(id, Arc::clone(&slot));
        Ok(slot)
    }

    pub fn slot(&self, id: &Uuid) -> Result<Option<Arc<SessionSlot>>, ChatError> {
        Ok(self
            .sessions
            .read()
            .map_err(|e| ChatError::StorageError(format!("store lock poisoned: {}", e)))?
            .get(id)
            .cloned())
    }

    /// Snapshot of a session.
    pub fn get(&self, id: &Uuid) -> Result<Option<Session>, ChatError> {
        match self.slot(id)? {
            Some(slot) => Ok(Some(slot.state()?.clone())),
            None => Ok(None),
        }
    }

    /// Run `f` against a session under its state lock.
    pub fn with_session<T>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<Option<T>, ChatError> {
        match self.slot(id)? {
            Some(slot) => {
                let mut session = slot.state()?;
                Ok(Some(f(&mut session)))
            }
            None => Ok(None),
        }
    }

    /// Remove a session and mark its slot ended. `false` if it was not present.
    pub fn remove(&self, id: &Uuid) -> Result<bool, ChatError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| ChatError::StorageError(format!("store lock poisoned: {}", e)))?;
        match sessions.remove(id) {
            Some(slot) => {
                slot.mark_ended()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn contains(&self, id: &Uuid) -> Result<bool, ChatError> {
        Ok(self.slot(id)?.is_some())
    }

    pub fn len(&self) -> Result<usize, ChatError> {
        Ok(self
            .sessions
            .read()
            .map_err(|e| ChatError::StorageError(format!("store lock poisoned: {}", e)))?
            .len())
    }

    pub fn is_empty(&self) -> Result<bool, ChatError> {
        Ok(self.len()? == 0)
    }
}
