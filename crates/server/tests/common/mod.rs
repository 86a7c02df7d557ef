//! Common test utilities for in-process API testing with mocks.
//!
//! The fixture builds the real router over a session whose request client is
//! a `MockRequestClient`, so no backend under test is needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use ratefire_core::{client::ApiResponse, testing::MockRequestClient, BenchSession, Config, TokioClock};
use ratefire_server::{api::create_router, state::AppState};

/// Test fixture for API testing with a mock backend.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.get("/api/v1/health").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock backend - configure item lists and action responses
    pub client: MockRequestClient,
    /// Session behind the router
    pub session: Arc<BenchSession>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Two default competitors, ring capacity 100, backend returning 10 items.
    pub async fn new() -> Self {
        Self::with_items(10).await
    }

    pub async fn with_items(count: usize) -> Self {
        let client = MockRequestClient::new();
        let items: Vec<Value> = (0..count)
            .map(|i| json!({"id": format!("item-{}", i)}))
            .collect();
        client
            .set_default_response(ApiResponse::new(200, json!(items).to_string()))
            .await;

        let mut config = Config::default();
        config.bench.competitor_count = 2;
        config.bench.items_per_competitor = 100;

        let session = Arc::new(
            BenchSession::new(
                config,
                Arc::new(client.clone()),
                Arc::new(TokioClock::new()),
            )
            .expect("Failed to create session"),
        );

        let state = Arc::new(AppState::new(Arc::clone(&session)));
        let router = create_router(state);

        Self {
            router,
            client,
            session,
        }
    }

    /// Tokens, preparation URL and action URL for a ready-to-run bench.
    pub async fn configure(&self) {
        let response = self
            .put(
                "/api/v1/settings",
                json!({
                    "competitors": [
                        {"name": "Andy", "token": "tok-a"},
                        {"name": "Bob", "token": "tok-b"}
                    ],
                    "preparation": {"method": "GET", "url": "http://bench.test/items"},
                    "action": {
                        "method": "GET",
                        "url": "http://bench.test/items/{id}",
                        "requestsPerMinute": 60
                    }
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text);
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a PATCH request with JSON body.
    pub async fn patch(&self, path: &str, body: Value) -> TestResponse {
        self.request("PATCH", path, Some(body)).await
    }

    /// Send a request with a raw string body (for testing malformed JSON).
    pub async fn request_raw(&self, method: &str, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            text,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
