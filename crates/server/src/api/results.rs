use std::sync::Arc;

use axum::{extract::State, Json};
use ratefire_core::session::ResultsView;

use crate::state::AppState;

/// GET /api/v1/results
///
/// Ledger snapshot, leaderboard and scheduler status in one document.
pub async fn get_results(State(state): State<Arc<AppState>>) -> Json<ResultsView> {
    Json(state.session().results().await)
}
