//! Action (dispatch run) API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use ratefire_core::DispatchStatus;
use serde::Serialize;

use super::handlers::{error_response, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub run_id: String,
    pub status: DispatchStatus,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    /// False when no run was active.
    pub stopped: bool,
    pub status: DispatchStatus,
}

/// POST /api/v1/action/start
///
/// Validate the action template and begin the countdown.
pub async fn start(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<StartResponse>), (StatusCode, Json<ErrorResponse>)> {
    let run_id = state
        .session()
        .start_action()
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(StartResponse {
            run_id: run_id.to_string(),
            status: state.session().status().await,
        }),
    ))
}

/// POST /api/v1/action/stop
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<StopResponse> {
    let stopped = state.session().stop_action().await;
    Json(StopResponse {
        stopped,
        status: state.session().status().await,
    })
}

/// GET /api/v1/action/status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<DispatchStatus> {
    Json(state.session().status().await)
}
