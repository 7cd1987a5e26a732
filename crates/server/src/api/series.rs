//! Mirror API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use mirror_core::SeriesStats;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /api/v1/series/stats
///
/// Row counts for the mirrored tables.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SeriesStats>, impl IntoResponse> {
    match state.store().stats() {
        Ok(stats) => Ok(Json(stats)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
