//! Mock implementations for testing
//!
//! These mocks enable controller and gateway tests without real I/O.

use super::Controller;
use crate::gateway::{Endpoint, GatewayError, RequestGateway, Transport};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Semaphore};

// ============================================================================
// Mock Transport
// ============================================================================

/// Mock transport that returns queued responses
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Value, GatewayError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<(Endpoint, Value)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: Value) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: GatewayError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<(Endpoint, Value)> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> Result<Value, GatewayError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::network("No mock response queued")))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, endpoint: Endpoint, payload: &Value) -> Result<Value, GatewayError> {
        self.requests
            .lock()
            .unwrap()
            .push((endpoint, payload.clone()));
        self.next_response()
    }
}

// ============================================================================
// Gated Transport (for in-flight testing)
// ============================================================================

/// Mock transport whose calls block until the test releases them
pub struct GatedTransport {
    inner: MockTransport,
    gate: Semaphore,
    calls: watch::Sender<usize>,
}

impl GatedTransport {
    pub fn new() -> Self {
        let (calls, _) = watch::channel(0);
        Self {
            inner: MockTransport::new(),
            gate: Semaphore::new(0),
            calls,
        }
    }

    pub fn queue_response(&self, response: Value) {
        self.inner.queue_response(response);
    }

    /// Let one blocked (or future) call complete
    pub fn release_one(&self) {
        self.release(1);
    }

    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Number of calls that have started
    pub fn call_count(&self) -> usize {
        *self.calls.borrow()
    }

    /// Wait until at least `n` calls have started
    pub async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.calls.subscribe();
        rx.wait_for(|count| *count >= n).await.unwrap();
    }

    pub fn recorded_requests(&self) -> Vec<(Endpoint, Value)> {
        self.inner.recorded_requests()
    }
}

impl Default for GatedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn post(&self, endpoint: Endpoint, payload: &Value) -> Result<Value, GatewayError> {
        self.inner
            .requests
            .lock()
            .unwrap()
            .push((endpoint, payload.clone()));
        self.calls.send_modify(|count| *count += 1);
        self.gate.acquire().await.unwrap().forget();
        self.inner.next_response()
    }
}

// ============================================================================
// Test Controller
// ============================================================================

/// A running controller wired to a mock transport
pub struct TestController<T> {
    pub controller: Controller,
    pub transport: Arc<T>,
    pub gateway: Arc<RequestGateway<Arc<T>>>,
}

impl<T: Transport + 'static> TestController<T> {
    pub fn with_transport(transport: T) -> Self {
        let transport = Arc::new(transport);
        let gateway = Arc::new(RequestGateway::new(transport.clone()));
        let controller = Controller::spawn(gateway.clone());
        Self {
            controller,
            transport,
            gateway,
        }
    }
}

impl TestController<MockTransport> {
    pub fn mock() -> Self {
        Self::with_transport(MockTransport::new())
    }
}

impl TestController<GatedTransport> {
    pub fn gated() -> Self {
        Self::with_transport(GatedTransport::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_mock_transport() {
        let mock = MockTransport::new();
        mock.queue_response(json!("Hello"));

        let response = mock.post(Endpoint::Chat, &json!({ "message": "hi" })).await.unwrap();
        assert_eq!(response, json!("Hello"));

        // Second call should fail (no more responses)
        let result = mock.post(Endpoint::Chat, &json!({})).await;
        assert!(result.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_gated_transport_blocks_until_released() {
        let gated = Arc::new(GatedTransport::new());
        gated.queue_response(json!("done"));

        let g = gated.clone();
        let call = tokio::spawn(async move { g.post(Endpoint::Chat, &json!({})).await });
        gated.wait_for_calls(1).await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!call.is_finished());

        gated.release_one();
        assert_eq!(call.await.unwrap().unwrap(), json!("done"));
        assert_eq!(gated.call_count(), 1);
    }
}
