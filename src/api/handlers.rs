//! HTTP request handlers

use super::sse::fragment_stream;
use super::types::{CancelResponse, ChatRequest, ErrorResponse, SessionResponse, TranscriptResponse};
use super::AppState;
use crate::orchestrator::TurnError;
use crate::session::SessionError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions/new", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        // Submitting a turn answers with the turn's fragment stream
        .route("/api/sessions/:id/chat", post(chat))
        .route("/api/sessions/:id/cancel", post(cancel))
        .route("/version", get(get_version))
        .with_state(state)
}

async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let (conversation_id, _) = state.sessions.create().await;
    tracing::info!(session_id = %conversation_id, "session created");
    Json(SessionResponse { conversation_id })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TranscriptResponse>, AppError> {
    let session = state.sessions.get(&id).await?;
    Ok(Json(TranscriptResponse {
        conversation_id: session.conversation_id(),
        messages: session.transcript(),
    }))
}

/// Submit user input. The user entry is appended synchronously before the
/// runtime is called; the response body is the turn's fragment stream.
async fn chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let ops_rx = state.sessions.submit(&id, req.text).await?;
    Ok(fragment_stream(ops_rx).into_response())
}

async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, AppError> {
    let session = state.sessions.get(&id).await?;
    Ok(Json(CancelResponse {
        cancelled: session.cancel_turn(),
    }))
}

async fn get_version() -> &'static str {
    concat!("cryptosage ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

struct AppError(SessionError);

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SessionError::NotFound => StatusCode::NOT_FOUND,
            SessionError::Turn(TurnError::TurnInProgress) => StatusCode::CONFLICT,
            SessionError::Turn(TurnError::Transcript(_)) => StatusCode::BAD_REQUEST,
            SessionError::Turn(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorResponse::new(self.0.to_string()));
        (status, body).into_response()
    }
}
