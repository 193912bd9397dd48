//! Axum route handlers for the Revision Engine.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::layout::Layout;
use crate::revision::diff::{analyze_transform, TransformAnalysis};
use crate::revision::interpreter::Interpretation;
use crate::revision::sessions::{EditOutcome, HistoryStep, SessionSnapshot};
use crate::revision::transforms::Transform;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub before: Layout,
    pub after: Layout,
}

#[derive(Debug, Deserialize)]
pub struct InterpretRequest {
    pub text: String,
    pub layout: Layout,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub layout: Layout,
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct TransformsRequest {
    pub transforms: Vec<Transform>,
}

fn validate_layout(field: &str, layout: &Layout) -> Result<(), AppError> {
    layout
        .validate()
        .map_err(|reason| AppError::Validation(format!("{field}: {reason}")))
}

// ────────────────────────────────────────────────────────────────────────────
// Stateless
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/layouts/analyze
pub async fn handle_analyze(
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<TransformAnalysis>, AppError> {
    validate_layout("before", &req.before)?;
    validate_layout("after", &req.after)?;
    Ok(Json(analyze_transform(&req.before, &req.after)))
}

/// POST /api/v1/commands/interpret
pub async fn handle_interpret(
    State(state): State<AppState>,
    Json(req): Json<InterpretRequest>,
) -> Result<Json<Interpretation>, AppError> {
    validate_layout("layout", &req.layout)?;
    Ok(Json(state.interpreter.interpret(&req.text, &req.layout)))
}

// ────────────────────────────────────────────────────────────────────────────
// Sessions
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    validate_layout("layout", &req.layout)?;
    let snapshot = state.sessions.create(req.layout).await;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.sessions.get(id).await?))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/commands
pub async fn handle_session_command(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<EditOutcome>, AppError> {
    let outcome = state
        .sessions
        .run_command(id, &req.text, &state.catalog)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/sessions/:id/transforms
pub async fn handle_session_transforms(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TransformsRequest>,
) -> Result<Json<EditOutcome>, AppError> {
    if req.transforms.is_empty() {
        return Err(AppError::Validation(
            "transforms cannot be empty".to_string(),
        ));
    }
    let outcome = state
        .sessions
        .apply_transforms(id, &req.transforms, &state.catalog)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/sessions/:id/undo
pub async fn handle_undo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryStep>, AppError> {
    Ok(Json(state.sessions.undo(id).await?))
}

/// POST /api/v1/sessions/:id/redo
pub async fn handle_redo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryStep>, AppError> {
    Ok(Json(state.sessions.redo(id).await?))
}
