//! Report types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::HttpMethod;
use crate::ledger::RunCounters;

/// Action settings echoed in the report header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportContext {
    pub action_url: String,
    pub method: HttpMethod,
    pub requests_per_minute: u32,
}

/// Status of one exported request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetailStatus {
    Passed,
    Failed,
    Unfinished,
}

impl DetailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailStatus::Passed => "passed",
            DetailStatus::Failed => "failed",
            DetailStatus::Unfinished => "unfinished",
        }
    }
}

/// One request row of the detail export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailRecord {
    pub competitor: String,
    pub item_id: String,
    pub status: DetailStatus,
    /// Response latency, only for settled requests with both timestamps.
    pub duration_seconds: Option<f64>,
    pub request_time: Option<DateTime<Utc>>,
}

/// Per-competitor totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompetitorSummary {
    pub name: String,
    #[serde(flatten)]
    pub counters: RunCounters,
}

/// Aggregated results of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub test_duration_secs: f64,
    pub action_url: String,
    pub method: HttpMethod,
    pub requests_per_minute: u32,
    pub matrix_duration_secs: u64,
    pub competitor_count: usize,
    pub competitors: Vec<CompetitorSummary>,
    pub overall: RunCounters,
    /// Percentage of requests that passed, 0 when nothing was sent.
    pub success_rate: f64,
    pub requests_per_second: f64,
    pub details: Vec<DetailRecord>,
}

/// A rendered report document.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedReport {
    pub filename: String,
    pub content_type: &'static str,
    pub content: String,
}

/// Report errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("No test results available. Please run a test first.")]
    NoResults,
}
