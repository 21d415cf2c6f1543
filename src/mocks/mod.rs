//! Mock transport for testing.
//!
//! [`MockHttpTransport`] replays queued responses in order and records every
//! request it receives, so tests can assert on exact call counts.

use crate::errors::{DinlrResult, NetworkError};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use bytes::Bytes;
use http::HeaderMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;

/// A mock response to return
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Bytes,
    /// Response headers
    pub headers: HeaderMap,
    /// Delay before answering
    pub delay: Option<Duration>,
    /// Fail with a timeout instead of answering
    pub timeout: bool,
}

impl MockResponse {
    /// Create a successful JSON response
    pub fn json(data: &Value) -> Self {
        Self::json_with_status(200, data)
    }

    /// Create a JSON response with any status
    pub fn json_with_status(status: u16, data: &Value) -> Self {
        Self::raw(status, data.to_string())
    }

    /// Create a `{"data": ...}` envelope response
    pub fn data(data: Value) -> Self {
        Self::json(&serde_json::json!({ "data": data }))
    }

    /// Create an error response with a `message` body
    pub fn error(status: u16, message: &str) -> Self {
        Self::json_with_status(status, &serde_json::json!({ "message": message }))
    }

    /// Create a response with an empty body
    pub fn empty(status: u16) -> Self {
        Self::raw(status, Bytes::new())
    }

    /// Create a response with a raw body
    pub fn raw(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: HeaderMap::new(),
            delay: None,
            timeout: false,
        }
    }

    /// Create a response that fails as a network timeout
    pub fn timeout() -> Self {
        Self {
            timeout: true,
            ..Self::empty(0)
        }
    }

    /// Wait before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Mock HTTP transport for testing
#[derive(Debug, Default)]
pub struct MockHttpTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response to return
    pub fn add_response(&self, response: MockResponse) {
        self.responses.lock().push_back(response);
    }

    /// Get recorded requests
    pub fn get_requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Get the last request
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }

    /// Number of requests received
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Clear recorded requests
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: HttpRequest) -> DinlrResult<HttpResponse> {
        self.requests.lock().push(request);

        let response = self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| MockResponse::raw(500, "No mock response configured"));

        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }

        if response.timeout {
            return Err(NetworkError::Timeout {
                timeout: response.delay.unwrap_or_default(),
            }
            .into());
        }

        Ok(HttpResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
        })
    }
}
