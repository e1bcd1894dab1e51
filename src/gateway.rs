//! Request gateway
//!
//! Wraps outbound calls to the remote service behind a uniform
//! pending/error/result contract. The gateway does not interpret response
//! bodies; callers decode them with the helpers in `types`.

mod error;
mod http;
mod types;

pub use error::{GatewayError, GatewayErrorKind, FALLBACK_MESSAGE};
pub use http::HttpTransport;
pub use types::{decode_chat_reply, ChatRequest, Endpoint, UpLevelRequest, UpLevelResponse};

use async_trait::async_trait;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// A single outbound request/response exchange with the remote service
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, endpoint: Endpoint, payload: &Value) -> Result<Value, GatewayError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn post(&self, endpoint: Endpoint, payload: &Value) -> Result<Value, GatewayError> {
        (**self).post(endpoint, payload).await
    }
}

/// Logging wrapper for transports
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T: Transport> LoggingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: Transport> Transport for LoggingTransport<T> {
    async fn post(&self, endpoint: Endpoint, payload: &Value) -> Result<Value, GatewayError> {
        let start = Instant::now();
        let result = self.inner.post(endpoint, payload).await;
        let duration = start.elapsed();

        match &result {
            Ok(_) => {
                tracing::info!(
                    endpoint = %endpoint,
                    duration_ms = %duration.as_millis(),
                    "Service request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %endpoint,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.detail,
                    "Service request failed"
                );
            }
        }

        result
    }
}

/// Observable request status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestState {
    in_flight: usize,
    last_error: Option<String>,
}

impl RequestState {
    pub fn pending(&self) -> bool {
        self.in_flight > 0
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

impl Serialize for RequestState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire<'a> {
            pending: bool,
            last_error: Option<&'a str>,
        }
        Wire {
            pending: self.pending(),
            last_error: self.last_error(),
        }
        .serialize(serializer)
    }
}

/// Gateway that tracks pending/error state around each call.
///
/// Concurrent calls are allowed; `pending` stays set until the last one
/// finishes. Failed calls are never retried.
pub struct RequestGateway<T> {
    transport: T,
    state: watch::Sender<RequestState>,
}

impl<T: Transport> RequestGateway<T> {
    pub fn new(transport: T) -> Self {
        let (state, _) = watch::channel(RequestState::default());
        Self { transport, state }
    }

    pub fn state(&self) -> RequestState {
        self.state.borrow().clone()
    }

    /// Subscribe to request state changes
    #[allow(dead_code)] // For in-process observers
    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }

    /// Perform one call to `endpoint`.
    ///
    /// On failure the display message is stored as `last_error` before the
    /// error is returned to the caller.
    pub async fn send<P: Serialize + Sync>(
        &self,
        endpoint: Endpoint,
        payload: &P,
    ) -> Result<Value, GatewayError> {
        self.state.send_modify(|s| {
            s.in_flight += 1;
            s.last_error = None;
        });

        let result = match serde_json::to_value(payload) {
            Ok(body) => self.transport.post(endpoint, &body).await,
            Err(e) => Err(GatewayError::decode(format!("Failed to encode payload: {e}"))),
        };

        self.state.send_modify(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);
            if let Err(e) = &result {
                s.last_error = Some(e.display_message());
            }
        });

        result
    }

    /// Record a failure detected after `send` returned, such as an
    /// undecodable body.
    pub fn record_error(&self, error: &GatewayError) {
        self.state
            .send_modify(|s| s.last_error = Some(error.display_message()));
    }
}
