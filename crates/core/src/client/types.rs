//! Types for the outbound request contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// HTTP method used by request templates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload derived from a user-supplied body template.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Blank template, nothing is sent.
    Empty,
    /// Template parsed as JSON.
    Json(Value),
    /// Template that is not valid JSON, sent verbatim.
    Raw(String),
}

impl RequestBody {
    /// Interpret a body template.
    ///
    /// Blank text yields `Empty`, well-formed JSON yields `Json`, anything
    /// else is kept as the literal string.
    pub fn from_template(template: &str) -> Self {
        if template.trim().is_empty() {
            return RequestBody::Empty;
        }
        match serde_json::from_str::<Value>(template) {
            Ok(value) => RequestBody::Json(value),
            Err(_) => RequestBody::Raw(template.to_string()),
        }
    }
}

/// A single outbound request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: RequestBody,
    pub headers: BTreeMap<String, String>,
}

/// Response returned by a `RequestClient`.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status code is in the 2xx range.
    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON, `None` when it is not valid JSON.
    pub fn parse_json_body(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Human readable reason for a non-successful response.
    pub fn failure_reason(&self) -> String {
        format!(
            "HTTP {}: {}",
            self.status,
            self.body.chars().take(200).collect::<String>()
        )
    }
}

/// Errors raised before a response is available.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),
}

/// Transport used for every outbound call.
#[async_trait]
pub trait RequestClient: Send + Sync {
    /// Client name for logging.
    fn name(&self) -> &str;

    /// Send one request and wait for its response.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError>;
}
