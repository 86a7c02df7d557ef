use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use ratefire_core::{Config, SessionError};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a session error to an HTTP status and `{error}` body.
pub fn error_response(err: SessionError) -> (StatusCode, Json<ErrorResponse>) {
    use ratefire_core::{DispatchError, RegistryError, ReportError};

    let status = match &err {
        SessionError::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
        SessionError::Report(ReportError::NoResults) => StatusCode::NOT_FOUND,
        SessionError::Dispatch(DispatchError::AlreadyRunning)
        | SessionError::RunActive
        | SessionError::PreparationInProgress
        | SessionError::CompetitorsChanged => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config().clone())
}

/// GET /metrics
///
/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
