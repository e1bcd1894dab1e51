//! HTTP transport for the remote service (JSON over POST)

use super::{Endpoint, GatewayError, Transport};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> GatewayError {
        let err = GatewayError::service(status.as_u16(), format!("HTTP {status}: {body}"));
        let message = serde_json::from_str::<Value>(body).ok().and_then(|parsed| {
            parsed
                .get("message")
                .and_then(Value::as_str)
                .map(String::from)
        });
        match message {
            Some(message) => err.with_service_message(message),
            None => err,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, endpoint: Endpoint, payload: &Value) -> Result<Value, GatewayError> {
        let response = self
            .client
            .post(self.url(endpoint))
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::timeout(format!("Request timeout: {e}"))
                } else {
                    GatewayError::network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::timeout(format!("Response timeout: {e}"))
            } else {
                GatewayError::network(format!("Failed to read response: {e}"))
            }
        })?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        // Non-JSON success bodies are treated as a bare string reply
        Ok(serde_json::from_str(&body).unwrap_or_else(|_| Value::String(body)))
    }
}
