//! Reduce run states into report data.

use chrono::{DateTime, TimeDelta, Utc};

use super::types::{
    CompetitorSummary, DetailRecord, DetailStatus, ReportContext, ReportData, ReportError,
};
use crate::dispatch::RunTiming;
use crate::ledger::{CompetitorRunState, RunCounters, SlotStatus};

/// Aggregate the ledger into summary metrics and detail rows.
///
/// The run must have started. The end of the run is its stop time, or `now`
/// while it is still going. Detail rows only cover requests issued within
/// `matrix_duration_secs` of the actual start; summary counts cover all.
pub fn summarize(
    states: &[CompetitorRunState],
    timing: &RunTiming,
    context: &ReportContext,
    matrix_duration_secs: u64,
    now: DateTime<Utc>,
) -> Result<ReportData, ReportError> {
    let start_time = timing.actual_start.ok_or(ReportError::NoResults)?;
    let end_time = timing.stopped_at.unwrap_or(now);
    let test_duration_secs = (end_time - start_time).num_milliseconds() as f64 / 1000.0;

    let mut overall = RunCounters::default();
    let competitors: Vec<CompetitorSummary> = states
        .iter()
        .map(|state| {
            overall.total += state.counters.total;
            overall.passed += state.counters.passed;
            overall.failed += state.counters.failed;
            overall.running += state.counters.running;
            CompetitorSummary {
                name: state.name.clone(),
                counters: state.counters,
            }
        })
        .collect();

    let success_rate = if overall.total > 0 {
        overall.passed as f64 / overall.total as f64 * 100.0
    } else {
        0.0
    };
    let requests_per_second = if test_duration_secs > 0.0 {
        overall.total as f64 / test_duration_secs
    } else {
        0.0
    };

    // A window too large to represent has no upper bound.
    let matrix_end = i64::try_from(matrix_duration_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|window| start_time.checked_add_signed(window));
    let details = states
        .iter()
        .flat_map(|state| {
            state.slots().filter_map(move |slot| {
                if slot.status == SlotStatus::Empty {
                    return None;
                }
                let item_id = slot.id.clone()?;
                if matches!((slot.request_time, matrix_end), (Some(t), Some(end)) if t > end) {
                    return None;
                }
                let (status, duration_seconds) = match slot.status {
                    SlotStatus::Pass => (DetailStatus::Passed, slot.duration_seconds()),
                    SlotStatus::Fail => (DetailStatus::Failed, slot.duration_seconds()),
                    _ => (DetailStatus::Unfinished, None),
                };
                Some(DetailRecord {
                    competitor: state.name.clone(),
                    item_id,
                    status,
                    duration_seconds,
                    request_time: slot.request_time,
                })
            })
        })
        .collect();

    Ok(ReportData {
        start_time,
        end_time,
        test_duration_secs,
        action_url: context.action_url.clone(),
        method: context.method,
        requests_per_minute: context.requests_per_minute,
        matrix_duration_secs,
        competitor_count: states.len(),
        competitors,
        overall,
        success_rate,
        requests_per_second,
        details,
    })
}
