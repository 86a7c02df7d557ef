//! Mock request client for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::client::{ApiRequest, ApiResponse, ClientError, RequestClient};

type CannedResult = Result<ApiResponse, ClientError>;

/// Mock implementation of the RequestClient trait.
///
/// Provides controllable behavior for testing:
/// - Record every request for assertions
/// - Canned responses per bearer token or per URL
/// - Simulated latency, globally or per token
///
/// Lookup order is URL, then token, then the default response.
///
/// # Example
///
/// ```rust,ignore
/// use ratefire_core::testing::MockRequestClient;
///
/// let client = MockRequestClient::new();
/// client.set_default_response(ApiResponse::new(200, "[]")).await;
/// client.set_response_for_token("tok-b", Err(ClientError::Timeout)).await;
///
/// // ... run a benchmark against it ...
///
/// assert_eq!(client.request_count().await, 4);
/// ```
#[derive(Debug, Clone)]
pub struct MockRequestClient {
    /// Recorded requests.
    requests: Arc<RwLock<Vec<ApiRequest>>>,
    /// Response used when nothing more specific matches.
    default_response: Arc<RwLock<CannedResult>>,
    /// Responses keyed by bearer token.
    token_responses: Arc<RwLock<HashMap<String, CannedResult>>>,
    /// Responses keyed by exact URL.
    url_responses: Arc<RwLock<HashMap<String, CannedResult>>>,
    /// Latency applied to every request.
    delay: Arc<RwLock<Option<Duration>>>,
    /// Latency keyed by bearer token, overrides `delay`.
    token_delays: Arc<RwLock<HashMap<String, Duration>>>,
}

impl Default for MockRequestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRequestClient {
    /// Create a mock client that answers `200 []` to everything.
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            default_response: Arc::new(RwLock::new(Ok(ApiResponse::new(200, "[]")))),
            token_responses: Arc::new(RwLock::new(HashMap::new())),
            url_responses: Arc::new(RwLock::new(HashMap::new())),
            delay: Arc::new(RwLock::new(None)),
            token_delays: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Set the response used when no override matches.
    pub async fn set_default_response(&self, response: ApiResponse) {
        *self.default_response.write().await = Ok(response);
    }

    /// Make every unmatched request fail with `error`.
    pub async fn set_default_error(&self, error: ClientError) {
        *self.default_response.write().await = Err(error);
    }

    /// Set the result for requests carrying `bearer <token>`.
    pub async fn set_response_for_token(&self, token: &str, result: CannedResult) {
        self.token_responses
            .write()
            .await
            .insert(token.to_string(), result);
    }

    /// Set the result for requests to exactly `url`.
    pub async fn set_response_for_url(&self, url: &str, result: CannedResult) {
        self.url_responses
            .write()
            .await
            .insert(url.to_string(), result);
    }

    /// Delay every response by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Delay responses for one token.
    pub async fn set_delay_for_token(&self, token: &str, delay: Duration) {
        self.token_delays
            .write()
            .await
            .insert(token.to_string(), delay);
    }

    /// Get all recorded requests.
    pub async fn recorded_requests(&self) -> Vec<ApiRequest> {
        self.requests.read().await.clone()
    }

    /// Number of requests sent so far.
    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Requests sent with `bearer <token>`.
    pub async fn requests_for_token(&self, token: &str) -> Vec<ApiRequest> {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| bearer_token(r).as_deref() == Some(token))
            .cloned()
            .collect()
    }

    /// Clear recorded requests.
    pub async fn clear(&self) {
        self.requests.write().await.clear();
    }

    async fn resolve(&self, request: &ApiRequest, token: Option<&str>) -> CannedResult {
        if let Some(result) = self.url_responses.read().await.get(&request.url) {
            return result.clone();
        }
        if let Some(token) = token {
            if let Some(result) = self.token_responses.read().await.get(token) {
                return result.clone();
            }
        }
        self.default_response.read().await.clone()
    }
}

fn bearer_token(request: &ApiRequest) -> Option<String> {
    request
        .headers
        .get("Authorization")
        .and_then(|value| value.strip_prefix("bearer "))
        .map(str::to_string)
}

#[async_trait]
impl RequestClient for MockRequestClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let token = bearer_token(&request);
        self.requests.write().await.push(request.clone());

        let delay = match token.as_deref() {
            Some(t) => self.token_delays.read().await.get(t).copied(),
            None => None,
        };
        let delay = match delay {
            Some(d) => Some(d),
            None => *self.delay.read().await,
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.resolve(&request, token.as_deref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{HttpMethod, RequestBody};
    use std::collections::BTreeMap;

    fn request(url: &str, token: &str) -> ApiRequest {
        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), format!("bearer {}", token));
        ApiRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            body: RequestBody::Empty,
            headers,
        }
    }

    #[tokio::test]
    async fn test_lookup_order() {
        let client = MockRequestClient::new();
        client
            .set_response_for_token("a", Ok(ApiResponse::new(201, "")))
            .await;
        client
            .set_response_for_url("http://x/special", Ok(ApiResponse::new(202, "")))
            .await;

        let by_default = client.send(request("http://x/1", "z")).await.unwrap();
        let by_token = client.send(request("http://x/1", "a")).await.unwrap();
        let by_url = client.send(request("http://x/special", "a")).await.unwrap();

        assert_eq!(by_default.status, 200);
        assert_eq!(by_token.status, 201);
        assert_eq!(by_url.status, 202);
        assert_eq!(client.request_count().await, 3);
        assert_eq!(client.requests_for_token("a").await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_applied() {
        let client = MockRequestClient::new();
        client.set_delay(Duration::from_secs(5)).await;

        let started = tokio::time::Instant::now();
        client.send(request("http://x/1", "a")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
