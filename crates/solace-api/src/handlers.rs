//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path/body parameters via axum extractors, calls
//! the engine on `AppState`, and returns JSON responses.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use solace_chat::{ChatError, ExportedTurn, ResponseMetadata, SessionSummary};
use solace_core::types::EmotionalState;

use crate::error::ApiError;
use crate::state::AppState;

pub const APP_NAME: &str = "Solace";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Existing session. Missing, unknown, or malformed ids start a new one.
    pub session_id: Option<String>,
    pub message: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContextUpdateRequest {
    pub key: String,
    pub value: serde_json::Value,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreatedResponse {
    pub session_id: Uuid,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: Uuid,
    pub response: String,
    pub emotional_state: EmotionalState,
    pub timestamp: String,
    pub conversation_length: usize,
    pub metadata: ResponseMetadata,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET / - service banner.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        name: APP_NAME.to_string(),
        version: VERSION.to_string(),
        status: "running".to_string(),
    })
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let active_sessions = state.engine.session_count().map_err(internal)?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: VERSION.to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions,
    }))
}

/// POST /session - create an empty session. The body is optional.
pub async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();

    let create = || -> Result<Option<SessionCreatedResponse>, ChatError> {
        let id = state.engine.create_session(request.user_id)?;
        Ok(state
            .engine
            .get_session(&id)?
            .map(|session| SessionCreatedResponse {
                session_id: id,
                created_at: session.created_at.to_rfc3339(),
            }))
    };

    match create() {
        Ok(Some(created)) => Ok((StatusCode::CREATED, Json(created))),
        Ok(None) => Err(ApiError::Internal("Failed to create session".to_string())),
        Err(e) => {
            error!(error = %e, "Error creating session");
            Err(ApiError::Internal("Failed to create session".to_string()))
        }
    }
}

/// POST /chat - process one message.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let max_len = state.config.engine.max_message_length;
    let len = body.message.chars().count();
    if len == 0 {
        return Err(ApiError::BadRequest("'message' must not be empty".to_string()));
    }
    if len > max_len {
        return Err(ApiError::BadRequest(format!(
            "'message' exceeds {} characters",
            max_len
        )));
    }

    let session_id = body
        .session_id
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok());

    let result = state
        .engine
        .process_message_as(session_id, &body.message, body.user_id)
        .await
        .map_err(chat_failure)?;

    Ok(Json(ChatResponse {
        session_id: result.session_id,
        response: result.response,
        emotional_state: result.emotional_state,
        timestamp: Utc::now().to_rfc3339(),
        conversation_length: result.conversation_length,
        metadata: result.metadata,
    }))
}

/// GET /session/{id} - session summary.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSummary>, ApiError> {
    let id = parse_session_id(&id)?;
    state
        .engine
        .get_session_summary(&id)
        .map_err(internal)?
        .map(Json)
        .ok_or_else(ApiError::session_not_found)
}

/// GET /session/{id}/history - chronological turn export.
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ExportedTurn>>, ApiError> {
    let id = parse_session_id(&id)?;
    state
        .engine
        .get_conversation_export(&id)
        .map_err(internal)?
        .map(Json)
        .ok_or_else(ApiError::session_not_found)
}

/// DELETE /session/{id} - end a session.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_session_id(&id)?;
    if state.engine.end_session(&id).map_err(internal)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::session_not_found())
    }
}

/// PUT /session/{id}/context - set one context entry.
pub async fn update_context(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ContextUpdateRequest>,
) -> Result<StatusCode, ApiError> {
    let id = parse_session_id(&id)?;
    if body.key.trim().is_empty() {
        return Err(ApiError::BadRequest("'key' must not be empty".to_string()));
    }

    if state
        .engine
        .set_context_value(&id, body.key, body.value)
        .map_err(internal)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::session_not_found())
    }
}

/// A malformed id can never name a live session.
fn parse_session_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::session_not_found())
}

fn chat_failure(err: ChatError) -> ApiError {
    match err {
        ChatError::SessionEnded(id) => {
            info!(session_id = %id, "Chat target ended mid-message");
            ApiError::session_not_found()
        }
        other => {
            error!(error = %other, "Error processing message");
            ApiError::Internal("Failed to process message".to_string())
        }
    }
}

fn internal(err: ChatError) -> ApiError {
    error!(error = %err, "Engine storage failure");
    ApiError::Internal("Internal server error".to_string())
}
