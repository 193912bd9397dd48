//! Axum route handlers for the Layout Assembler.

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use crate::assembler::planner::DEFAULT_REQUIRED_KINDS;
use crate::assembler::search::{Assembler, AssemblyResult};
use crate::errors::AppError;
use crate::models::catalog::{BlockKind, BlockTemplate};
use crate::models::content::{ContentGraph, StyleTokens, Tone};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub content: ContentGraph,
    #[serde(default)]
    pub style: StyleTokens,
    #[serde(default)]
    pub tone: Tone,
    /// Defaults to hero, features, cta.
    #[serde(default)]
    pub required_kinds: Option<Vec<BlockKind>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/catalog
pub async fn handle_list_catalog(State(state): State<AppState>) -> Json<Vec<BlockTemplate>> {
    Json(state.catalog.templates().to_vec())
}

/// POST /api/v1/layouts/search
///
/// Runs the beam search. Missing-kind and search-exhausted failures are returned
/// verbatim as 422 responses; no partial layout is ever returned.
pub async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<AssemblyResult>, AppError> {
    let required = request
        .required_kinds
        .unwrap_or_else(|| DEFAULT_REQUIRED_KINDS.to_vec());
    if required.is_empty() {
        return Err(AppError::Validation(
            "required_kinds cannot be empty".to_string(),
        ));
    }

    info!(tone = %request.tone, ?required, "Layout search requested");

    // CPU-bound search: spawn_blocking keeps the async executor free.
    let catalog = state.catalog.clone();
    let config = state.assembly.clone();
    let result = tokio::task::spawn_blocking(move || {
        Assembler::new(&catalog, config).search(
            &request.content,
            &request.style,
            request.tone,
            &required,
        )
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in search: {e}")))??;

    Ok(Json(result))
}
