//! Types for the preparation stage.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::client::HttpMethod;

/// An opaque record fetched during preparation and replayed during the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(Value);

impl Item {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// The record's own `id`, when it is a string or a number.
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The record's id, or the synthetic `item-<index>` fallback.
    pub fn resolve_id(&self, index: usize) -> String {
        self.id().unwrap_or_else(|| format!("item-{}", index))
    }
}

/// Method, URL and body template for the preparation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestTemplate {
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub body: String,
}

/// Pre-flight errors that block the preparation stage.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreparationError {
    #[error("Please enter a URL for the preparation request")]
    MissingUrl,

    #[error("Please set up competitors first")]
    NoCompetitors,

    #[error("Please enter at least one API token")]
    NoTokens,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_id_string_and_number() {
        assert_eq!(Item::new(json!({"id": "abc"})).id(), Some("abc".to_string()));
        assert_eq!(Item::new(json!({"id": 42})).id(), Some("42".to_string()));
        assert_eq!(Item::new(json!({"id": 1.5})).id(), Some("1.5".to_string()));
    }

    #[test]
    fn test_item_without_usable_id() {
        assert_eq!(Item::new(json!({"name": "x"})).id(), None);
        assert_eq!(Item::new(json!({"id": null})).id(), None);
        assert_eq!(Item::new(json!({"id": ""})).id(), None);
        assert_eq!(Item::new(json!("scalar")).id(), None);
    }

    #[test]
    fn test_resolve_id_synthesizes_fallback() {
        assert_eq!(Item::new(json!({})).resolve_id(7), "item-7");
        assert_eq!(Item::new(json!({"id": 3})).resolve_id(7), "3");
    }

    #[test]
    fn test_request_template_defaults() {
        let template: RequestTemplate = serde_json::from_str(r#"{"url": "http://x"}"#).unwrap();
        assert_eq!(template.method, HttpMethod::Get);
        assert_eq!(template.url, "http://x");
        assert!(template.body.is_empty());
    }
}
