use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::error_response;
use crate::git::tree::TreeNode;
use crate::models::{IngestOutcome, IngestRequest};
use crate::state::AppState;

/// POST /api/ingest - Clone and index a repository, or reuse the live index
/// when it is the same repository.
pub async fn ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestOutcome>, (StatusCode, String)> {
    state
        .engine
        .ingest(&req.repo_url)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /api/reindex - Rebuild the current repository from its checkout.
pub async fn reindex(
    State(state): State<AppState>,
) -> Result<Json<IngestOutcome>, (StatusCode, String)> {
    state
        .engine
        .reindex()
        .await
        .map(Json)
        .map_err(error_response)
}

/// GET /api/tree - File tree of the indexed repository
pub async fn file_tree(State(state): State<AppState>) -> Json<Vec<TreeNode>> {
    Json(state.engine.file_tree())
}
