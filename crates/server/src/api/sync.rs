//! Sync control API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use uuid::Uuid;

use mirror_core::{SyncServiceError, SyncStatus};

use crate::state::AppState;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CycleStartedResponse {
    pub cycle_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CycleCancelledResponse {
    pub cycle_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn conflict(err: SyncServiceError) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::CONFLICT,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/sync
///
/// Start a sync cycle in the background.
pub async fn start_sync(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<CycleStartedResponse>), impl IntoResponse> {
    match state.sync().start().await {
        Ok(cycle_id) => Ok((StatusCode::ACCEPTED, Json(CycleStartedResponse { cycle_id }))),
        Err(e) => Err(conflict(e)),
    }
}

/// GET /api/v1/sync
///
/// Current phase plus the result of the last finished cycle.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<SyncStatus> {
    Json(state.sync().status().await)
}

/// DELETE /api/v1/sync
///
/// Ask the running cycle to stop at its next page or item boundary.
pub async fn cancel_sync(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<CycleCancelledResponse>), impl IntoResponse> {
    match state.sync().cancel().await {
        Ok(cycle_id) => Ok((
            StatusCode::ACCEPTED,
            Json(CycleCancelledResponse {
                cycle_id,
                message: "Cancellation requested".to_string(),
            }),
        )),
        Err(e) => Err(conflict(e)),
    }
}
