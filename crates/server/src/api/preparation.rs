//! Preparation API handler.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use ratefire_core::session::PreparationSummary;

use super::handlers::{error_response, ErrorResponse};
use crate::state::AppState;

/// POST /api/v1/preparation
///
/// Fetch every competitor's item list. Per-competitor failures leave that
/// competitor with no items and do not fail the request.
pub async fn run(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PreparationSummary>, (StatusCode, Json<ErrorResponse>)> {
    state
        .session()
        .prepare()
        .await
        .map(Json)
        .map_err(error_response)
}
