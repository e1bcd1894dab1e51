//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{DraftRequest, ErrorResponse, FollowUpRequest, OutcomeResponse, UpLevelRequest};
use super::AppState;
use crate::controller::Outcome;
use crate::runtime::{ClientSnapshot, RuntimeError};
use crate::session::ConversationId;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session state
        .route("/api/session", get(get_session))
        .route("/api/session/stream", get(stream_session))
        // Requests to the remote service
        .route("/api/uplevel", post(uplevel))
        .route("/api/follow-up", post(follow_up))
        // Navigation
        .route("/api/conversations/:id/select", post(select_conversation))
        .route("/api/reset", post(reset))
        // Drafts
        .route("/api/drafts/prompt", post(edit_prompt_draft))
        .route("/api/drafts/follow-up", post(edit_follow_up_draft))
        .route("/api/insert", post(insert_prompt))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session State
// ============================================================

async fn get_session(State(state): State<AppState>) -> Json<ClientSnapshot> {
    Json(state.controller.snapshot())
}

async fn stream_session(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before reading the snapshot so no change falls in between
    let events = state.controller.events();
    sse_stream(state.controller.snapshot(), events)
}

// ============================================================
// Operations
// ============================================================

fn outcome_response(result: Result<Outcome, RuntimeError>) -> Result<Json<OutcomeResponse>, AppError> {
    result
        .map(|outcome| Json(outcome.into()))
        .map_err(|e| AppError::Internal(e.to_string()))
}

async fn uplevel(
    State(state): State<AppState>,
    Json(req): Json<UpLevelRequest>,
) -> Result<Json<OutcomeResponse>, AppError> {
    outcome_response(state.controller.start_up_level(req.prompt).await)
}

async fn follow_up(
    State(state): State<AppState>,
    Json(req): Json<FollowUpRequest>,
) -> Result<Json<OutcomeResponse>, AppError> {
    outcome_response(state.controller.send_follow_up(req.question).await)
}

async fn select_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OutcomeResponse>, AppError> {
    let id: ConversationId = id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid conversation id: {id}")))?;
    outcome_response(state.controller.select_conversation(id).await)
}

async fn reset(State(state): State<AppState>) -> Result<Json<OutcomeResponse>, AppError> {
    outcome_response(state.controller.reset_to_new_prompt().await)
}

async fn edit_prompt_draft(
    State(state): State<AppState>,
    Json(req): Json<DraftRequest>,
) -> Result<Json<OutcomeResponse>, AppError> {
    outcome_response(state.controller.edit_prompt_draft(req.text).await)
}

async fn edit_follow_up_draft(
    State(state): State<AppState>,
    Json(req): Json<DraftRequest>,
) -> Result<Json<OutcomeResponse>, AppError> {
    outcome_response(state.controller.edit_follow_up_draft(req.text).await)
}

async fn insert_prompt(State(state): State<AppState>) -> Result<Json<OutcomeResponse>, AppError> {
    outcome_response(state.controller.insert_prompt().await)
}

async fn get_version() -> impl IntoResponse {
    Json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
