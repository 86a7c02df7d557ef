//! Testing utilities and mock implementations.
//!
//! This module provides a mock request client and a manual clock, allowing
//! full benchmark runs to be tested without real backends.
//!
//! # Example
//!
//! ```rust,ignore
//! use ratefire_core::testing::{ManualClock, MockRequestClient};
//!
//! let client = MockRequestClient::new();
//! client.set_default_response(ApiResponse::new(200, r#"[{"id": 1}]"#)).await;
//!
//! let session = BenchSession::new(config, Arc::new(client.clone()), Arc::new(ManualClock::new()))?;
//! ```

mod manual_clock;
mod mock_request_client;

pub use manual_clock::ManualClock;
pub use mock_request_client::MockRequestClient;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use serde_json::json;
    use std::collections::HashMap;

    use crate::client::HttpMethod;
    use crate::ledger::{CompetitorRunState, RunCounters};
    use crate::preparation::Item;
    use crate::report::{CompetitorSummary, ReportData};

    /// 2024-01-01 00:00:00 UTC.
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    /// `count` items with ids `item-0..`.
    pub fn items(count: usize) -> Vec<Item> {
        (0..count)
            .map(|i| Item::new(json!({"id": format!("item-{}", i), "index": i})))
            .collect()
    }

    /// The same item list for every name.
    pub fn item_lists(names: &[&str], count: usize) -> HashMap<String, Vec<Item>> {
        names
            .iter()
            .map(|name| (name.to_string(), items(count)))
            .collect()
    }

    /// A run state whose requests all passed.
    pub fn run_state(name: &str, passed: u64) -> CompetitorRunState {
        let mut state = CompetitorRunState::new(name.to_string(), Vec::new(), 50);
        state.counters = RunCounters {
            total: passed,
            passed,
            failed: 0,
            running: 0,
        };
        state
    }

    /// Ten seconds, 50 requests, 45 passed, no detail rows.
    pub fn report_data() -> ReportData {
        let counters = RunCounters {
            total: 50,
            passed: 45,
            failed: 5,
            running: 0,
        };
        ReportData {
            start_time: epoch(),
            end_time: epoch() + TimeDelta::seconds(10),
            test_duration_secs: 10.0,
            action_url: "http://bench.test/items/{id}".to_string(),
            method: HttpMethod::Get,
            requests_per_minute: 60,
            matrix_duration_secs: 120,
            competitor_count: 1,
            competitors: vec![CompetitorSummary {
                name: "Andy".to_string(),
                counters,
            }],
            overall: counters,
            success_rate: 90.0,
            requests_per_second: 5.0,
            details: Vec::new(),
        }
    }
}
