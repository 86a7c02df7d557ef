//! Settings export/import handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use ratefire_core::{BenchSettings, SessionError, SettingsPatch};

use super::handlers::{error_response, ErrorResponse};
use crate::state::AppState;

/// GET /api/v1/settings
pub async fn export(State(state): State<Arc<AppState>>) -> Json<BenchSettings> {
    Json(state.session().export_settings().await)
}

/// PUT /api/v1/settings
///
/// Merge a settings document. The body is parsed here rather than by the
/// `Json` extractor so malformed documents get the same `{error}` shape.
pub async fn import(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<BenchSettings>, (StatusCode, Json<ErrorResponse>)> {
    let patch = SettingsPatch::from_json(&body)
        .map_err(|e| error_response(SessionError::Settings(e)))?;
    state
        .session()
        .import_settings(patch)
        .await
        .map(Json)
        .map_err(error_response)
}
