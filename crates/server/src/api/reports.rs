//! Report download handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use ratefire_core::RenderedReport;
use serde::Deserialize;

use super::handlers::{error_response, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SqlReportParams {
    /// Detail-row window in seconds; defaults to the configured value.
    #[serde(default)]
    pub matrix_duration_secs: Option<u64>,
}

fn attachment(report: RenderedReport) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", report.filename);
    (
        [
            (header::CONTENT_TYPE, report.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.content,
    )
        .into_response()
}

/// GET /api/v1/reports/markdown
pub async fn markdown(
    State(state): State<Arc<AppState>>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    state
        .session()
        .markdown_report()
        .await
        .map(attachment)
        .map_err(error_response)
}

/// GET /api/v1/reports/sql?matrix_duration_secs=N
pub async fn sql(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SqlReportParams>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    state
        .session()
        .sql_report(params.matrix_duration_secs)
        .await
        .map(attachment)
        .map_err(error_response)
}
