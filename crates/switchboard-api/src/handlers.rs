//! Route handler functions for all API endpoints.
//!
//! Each handler extracts its inputs via axum extractors, delegates to the
//! router or session store, and returns JSON responses.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use switchboard_core::{Attachment, Capability, ChatRequest, HealthSnapshot, UnifiedResponse};
use switchboard_session::{SessionSummary, Turn};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Response types
// =============================================================================

/// Body of a session-clear call.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub message: String,
    pub success: bool,
}

/// Body of a session-list call.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

/// Body of a history-fetch call.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub turns: Vec<Turn>,
}

/// Body of the root service descriptor.
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub service: String,
    pub version: String,
    pub backends: Vec<String>,
    pub endpoints: std::collections::BTreeMap<String, String>,
}

// =============================================================================
// Multipart decoding
// =============================================================================

/// Decode the multipart chat form into a [`ChatRequest`].
///
/// An undecodable form is a schema violation (422); a missing `message`
/// field and all content-level limits are client errors (400).
async fn parse_chat_request(mut multipart: Multipart) -> Result<ChatRequest, ApiError> {
    let mut message: Option<String> = None;
    let mut session_id: Option<String> = None;
    let mut file: Option<Attachment> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::UnprocessableEntity(format!("invalid multipart form: {}", e)))?
    {
        match field.name() {
            Some("message") => {
                let text = field.text().await.map_err(|e| {
                    ApiError::UnprocessableEntity(format!("invalid 'message' field: {}", e))
                })?;
                message = Some(text);
            }
            Some("session_id") => {
                let text = field.text().await.map_err(|e| {
                    ApiError::UnprocessableEntity(format!("invalid 'session_id' field: {}", e))
                })?;
                if !text.is_empty() {
                    session_id = Some(text);
                }
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload.pdf").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        ApiError::UnprocessableEntity(format!("invalid 'file' field: {}", e))
                    })?
                    .to_vec();
                file = Some(Attachment {
                    filename,
                    content_type,
                    bytes,
                });
            }
            _ => {
                // Unknown fields are ignored, matching lenient form handling.
            }
        }
    }

    let message =
        message.ok_or_else(|| ApiError::BadRequest("field 'message' is required".to_string()))?;

    Ok(ChatRequest {
        message,
        session_id,
        file,
    })
}

// =============================================================================
// Unified endpoints
// =============================================================================

/// POST /chat - classify and dispatch one chat turn.
pub async fn chat(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UnifiedResponse>, ApiError> {
    let request = parse_chat_request(multipart).await?;
    let response = state.router.handle(request).await?;
    Ok(Json(response))
}

/// POST /chat/clear/{session_id} - drop a session's history.
///
/// Clearing a session that does not exist still reports success.
pub async fn clear_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ClearResponse>, ApiError> {
    state.sessions.clear(&session_id)?;
    Ok(Json(ClearResponse {
        message: format!("Session {} cleared", session_id),
        success: true,
    }))
}

/// GET /health - per-capability status plus an aggregate message.
pub async fn health(State(state): State<AppState>) -> Json<HealthSnapshot> {
    Json(state.monitor.check().await)
}

/// GET / - service descriptor.
pub async fn root() -> Json<ServiceDescriptor> {
    let endpoints = [
        ("unified", "/chat"),
        ("lf_assist", "/lf-assist/chat"),
        ("doc_assist", "/doc-assist/chat"),
        ("db_assist", "/db-assist/chat"),
        ("viz_assist", "/viz-assist/chat"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    Json(ServiceDescriptor {
        service: "Switchboard Router".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backends: Capability::ALL.iter().map(|c| c.label().to_string()).collect(),
        endpoints,
    })
}

// =============================================================================
// Per-capability endpoints (bypass classification)
// =============================================================================

/// POST /{capability}/chat - dispatch directly to one capability.
pub async fn chat_direct(
    capability: Capability,
    state: AppState,
    multipart: Multipart,
) -> Result<Json<UnifiedResponse>, ApiError> {
    let request = parse_chat_request(multipart).await?;
    let response = state.router.handle_direct(capability, request).await?;
    Ok(Json(response))
}

/// GET /{capability}/sessions - sessions last served by this capability.
pub async fn sessions_direct(
    capability: Capability,
    state: AppState,
) -> Result<Json<SessionsResponse>, ApiError> {
    let sessions = state
        .sessions
        .list()?
        .into_iter()
        .filter(|s| s.last_backend == Some(capability))
        .collect();
    Ok(Json(SessionsResponse { sessions }))
}

/// GET /{capability}/history/{session_id} - a session's turn history.
pub async fn history_direct(
    state: AppState,
    session_id: String,
) -> Result<Json<HistoryResponse>, ApiError> {
    let turns = state.sessions.history(&session_id)?;
    Ok(Json(HistoryResponse { session_id, turns }))
}
