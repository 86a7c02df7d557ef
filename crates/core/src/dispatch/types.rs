//! Types for the dispatch scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::client::HttpMethod;

/// Placeholder replaced with the item id in the action URL.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Action request template and rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionTemplate {
    #[serde(default)]
    pub method: HttpMethod,
    /// URL containing `{id}`.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub body: String,
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

fn default_requests_per_minute() -> u32 {
    60
}

impl Default for ActionTemplate {
    fn default() -> Self {
        Self {
            method: HttpMethod::Get,
            url: String::new(),
            body: String::new(),
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

impl ActionTemplate {
    /// Period between ticks, `60s / requests_per_minute`.
    pub fn tick_interval(&self) -> Option<Duration> {
        if self.requests_per_minute == 0 {
            return None;
        }
        Some(Duration::from_secs_f64(60.0 / self.requests_per_minute as f64))
    }

    /// Substitute the first `{id}` with `item_id`.
    pub fn render_url(&self, item_id: &str) -> String {
        self.url.replacen(ID_PLACEHOLDER, item_id, 1)
    }

    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.url.trim().is_empty() {
            return Err(DispatchError::MissingActionUrl);
        }
        if !self.url.contains(ID_PLACEHOLDER) {
            return Err(DispatchError::MissingIdPlaceholder);
        }
        if self.requests_per_minute == 0 {
            return Err(DispatchError::InvalidRate);
        }
        Ok(())
    }
}

/// Scheduler lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SchedulerState {
    #[default]
    Idle,
    CountingDown {
        remaining: u32,
    },
    Running,
}

impl SchedulerState {
    pub fn is_active(&self) -> bool {
        !matches!(self, SchedulerState::Idle)
    }
}

/// Timestamps of the current or most recent run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTiming {
    pub run_id: Option<Uuid>,
    /// When start was requested.
    pub pressed_at: Option<DateTime<Utc>>,
    /// When the countdown finished and ticking began.
    pub actual_start: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
}

/// Snapshot of the scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchStatus {
    #[serde(flatten)]
    pub state: SchedulerState,
    pub timing: RunTiming,
    /// Ticks fired in the current run.
    pub ticks: u64,
    pub requests_per_minute: u32,
}

/// A competitor taking part in a run.
#[derive(Debug, Clone)]
pub struct DispatchTarget {
    pub name: String,
    pub headers: BTreeMap<String, String>,
}

/// Pre-flight errors that block a run from starting.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Please enter a URL for the action requests")]
    MissingActionUrl,

    #[error("URL must include {{id}} placeholder which will be replaced with item IDs")]
    MissingIdPlaceholder,

    #[error("Requests per minute must be greater than zero")]
    InvalidRate,

    #[error("Please run the preparation step first to get items")]
    NotPrepared,

    #[error("No competitor has any items to dispatch")]
    NoItems,

    #[error("A run is already in progress")]
    AlreadyRunning,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(url: &str, rpm: u32) -> ActionTemplate {
        ActionTemplate {
            url: url.to_string(),
            requests_per_minute: rpm,
            ..Default::default()
        }
    }

    #[test]
    fn test_render_url_replaces_first_placeholder_only() {
        let a = action("http://x/items/{id}/copy/{id}", 60);
        assert_eq!(a.render_url("42"), "http://x/items/42/copy/{id}");
    }

    #[test]
    fn test_tick_interval() {
        assert_eq!(action("", 60).tick_interval(), Some(Duration::from_secs(1)));
        assert_eq!(action("", 120).tick_interval(), Some(Duration::from_millis(500)));
        assert_eq!(action("", 0).tick_interval(), None);
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            action("", 60).validate(),
            Err(DispatchError::MissingActionUrl)
        );
        assert_eq!(
            action("http://x/items", 60).validate(),
            Err(DispatchError::MissingIdPlaceholder)
        );
        assert_eq!(
            action("http://x/{id}", 0).validate(),
            Err(DispatchError::InvalidRate)
        );
        assert!(action("http://x/{id}", 60).validate().is_ok());
    }

    #[test]
    fn test_placeholder_error_message() {
        assert!(DispatchError::MissingIdPlaceholder
            .to_string()
            .starts_with("URL must include {id} placeholder"));
    }

    #[test]
    fn test_action_serializes_camel_case() {
        let json = serde_json::to_value(action("http://x/{id}", 30)).unwrap();
        assert_eq!(json["requestsPerMinute"], 30);
        assert_eq!(json["method"], "GET");
    }

    #[test]
    fn test_scheduler_state_serialization() {
        let json = serde_json::to_value(SchedulerState::CountingDown { remaining: 2 }).unwrap();
        assert_eq!(json["state"], "counting_down");
        assert_eq!(json["remaining"], 2);
        let status = DispatchStatus::default();
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["state"], "idle");
    }
}
