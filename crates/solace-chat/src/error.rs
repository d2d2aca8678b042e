//! Error types for the conversational core.

use std::time::Duration;

use solace_core::error::SolaceError;

/// Failure of an external capability (generation, embedding, classification).
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the chat engine that reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("embedding error: {0}")]
    Embedding(BackendError),
    #[error("storage error: {0}")]
    StorageError(String),
    #[error("session {0} ended while the message was being processed")]
    SessionEnded(uuid::Uuid),
}

impl From<ChatError> for SolaceError {
    fn from(err: ChatError) -> Self {
        SolaceError::Chat(err.to_string())
    }
}

impl From<BackendError> for SolaceError {
    fn from(err: BackendError) -> Self {
        SolaceError::Backend(err.to_string())
    }
}
