use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::error_response;
use crate::models::{SearchRequest, SearchResponse};
use crate::state::AppState;

/// POST /api/search - Rank units of the indexed repository with the requested
/// model ("bm25", "hybrid" or a vector modality).
pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let response = state
        .engine
        .search(&req.query, &req.model, req.k)
        .await
        .map_err(error_response)?;

    tracing::info!(
        "Search {:?} ({}) returned {} results",
        response.query,
        response.model,
        response.results.len()
    );
    Ok(Json(response))
}
