//! Types for the competitor registry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Names assigned to competitors at setup, in order.
pub const DEFAULT_NAMES: [&str; 10] = [
    "Andy", "Bob", "Chris", "Diana", "Eva", "Frank", "Grace", "Helen", "Ian", "Jack",
];

/// Upper bound on the number of competitors.
pub const MAX_COMPETITORS: usize = DEFAULT_NAMES.len();

/// One backend under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    #[serde(default)]
    pub token: String,
}

impl Competitor {
    pub fn new(name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: token.into(),
        }
    }

    /// A competitor takes part only when it has a non-blank token.
    pub fn is_active(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// Request headers derived from the token, `None` for inactive competitors.
    pub fn headers(&self) -> Option<BTreeMap<String, String>> {
        let token = self.token.trim();
        if token.is_empty() {
            return None;
        }
        let mut headers = BTreeMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Authorization".to_string(), format!("bearer {}", token));
        Some(headers)
    }
}

/// Errors from registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("at least one competitor is required")]
    NoCompetitors,

    #[error("at most {max} competitors are supported")]
    TooManyCompetitors { max: usize },

    #[error("competitor not found: {0}")]
    NotFound(String),

    #[error("competitor name already in use: {0}")]
    DuplicateName(String),

    #[error("competitor name cannot be empty")]
    EmptyName,
}
