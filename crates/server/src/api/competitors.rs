//! Competitor API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use ratefire_core::{Competitor, CompetitorUpdate};
use serde::{Deserialize, Serialize};

use super::handlers::{error_response, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SetupRequest {
    /// Falls back to the current competitor count.
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CompetitorListResponse {
    pub competitors: Vec<Competitor>,
    pub count: usize,
}

impl From<Vec<Competitor>> for CompetitorListResponse {
    fn from(competitors: Vec<Competitor>) -> Self {
        let count = competitors.len();
        Self { competitors, count }
    }
}

/// POST /api/v1/competitors/setup
///
/// Recreate the competitor list from the default names. Clears prepared items
/// and results.
pub async fn setup(
    State(state): State<Arc<AppState>>,
    body: Option<Json<SetupRequest>>,
) -> Result<Json<CompetitorListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    state
        .session()
        .setup_competitors(request.count)
        .await
        .map(|competitors| Json(competitors.into()))
        .map_err(error_response)
}

/// GET /api/v1/competitors
pub async fn list(State(state): State<Arc<AppState>>) -> Json<CompetitorListResponse> {
    Json(state.session().competitors().await.into())
}

/// PATCH /api/v1/competitors/{name}
///
/// Set the token and/or rename a competitor.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(update): Json<CompetitorUpdate>,
) -> Result<Json<Competitor>, (StatusCode, Json<ErrorResponse>)> {
    state
        .session()
        .update_competitor(&name, update)
        .await
        .map(Json)
        .map_err(error_response)
}
