//! Settings document types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::HttpMethod;
use crate::competitor::{Competitor, MAX_COMPETITORS};
use crate::ledger::MAX_ITEMS_PER_COMPETITOR;
use crate::dispatch::ActionTemplate;
use crate::preparation::RequestTemplate;

/// The exportable settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchSettings {
    pub competitor_count: usize,
    pub items_per_competitor: usize,
    pub competitors: Vec<Competitor>,
    pub preparation: RequestTemplate,
    pub action: ActionTemplate,
}

/// A partially specified settings document.
///
/// Absent fields keep their current values; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub competitor_count: Option<usize>,
    pub items_per_competitor: Option<usize>,
    pub competitors: Option<Vec<Competitor>>,
    pub preparation: Option<PreparationPatch>,
    pub action: Option<ActionPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreparationPatch {
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPatch {
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub body: Option<String>,
    pub requests_per_minute: Option<u32>,
}

impl PreparationPatch {
    fn apply_to(self, target: &mut RequestTemplate) {
        if let Some(method) = self.method {
            target.method = method;
        }
        if let Some(url) = self.url {
            target.url = url;
        }
        if let Some(body) = self.body {
            target.body = body;
        }
    }
}

impl ActionPatch {
    fn apply_to(self, target: &mut ActionTemplate) {
        if let Some(method) = self.method {
            target.method = method;
        }
        if let Some(url) = self.url {
            target.url = url;
        }
        if let Some(body) = self.body {
            target.body = body;
        }
        if let Some(rpm) = self.requests_per_minute {
            target.requests_per_minute = rpm;
        }
    }
}

impl SettingsPatch {
    /// Parse a settings document, tolerating missing and unknown fields.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(json).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Merge onto `current`, validating the result.
    pub fn apply(self, current: &BenchSettings) -> Result<BenchSettings, SettingsError> {
        let mut next = current.clone();
        if let Some(count) = self.competitor_count {
            next.competitor_count = count;
        }
        if let Some(capacity) = self.items_per_competitor {
            next.items_per_competitor = capacity;
        }
        if let Some(competitors) = self.competitors {
            next.competitors = competitors;
        }
        if let Some(preparation) = self.preparation {
            preparation.apply_to(&mut next.preparation);
        }
        if let Some(action) = self.action {
            action.apply_to(&mut next.action);
        }
        next.validate()?;
        Ok(next)
    }
}

impl BenchSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.competitor_count == 0 || self.competitor_count > MAX_COMPETITORS {
            return Err(SettingsError::Invalid(format!(
                "competitorCount must be between 1 and {}",
                MAX_COMPETITORS
            )));
        }
        if self.items_per_competitor == 0 || self.items_per_competitor > MAX_ITEMS_PER_COMPETITOR {
            return Err(SettingsError::Invalid(format!(
                "itemsPerCompetitor must be between 1 and {}",
                MAX_ITEMS_PER_COMPETITOR
            )));
        }
        if self.competitors.len() > MAX_COMPETITORS {
            return Err(SettingsError::Invalid(format!(
                "at most {} competitors are supported",
                MAX_COMPETITORS
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        serde_json::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))
    }
}

/// Settings errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid settings document: {0}")]
    Parse(String),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}
