//! Gateway error types

use thiserror::Error;

/// Message shown when the service gives nothing more specific.
pub const FALLBACK_MESSAGE: &str = "An error occurred. Please try again.";

/// Outbound call error with classification
#[derive(Debug, Clone, Error)]
#[error("{detail}")]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    /// Diagnostic detail for logs
    pub detail: String,
    /// `message` field from the service's error body, if it sent one
    pub service_message: Option<String>,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            service_message: None,
        }
    }

    pub fn with_service_message(mut self, message: impl Into<String>) -> Self {
        self.service_message = Some(message.into());
        self
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Network, detail)
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Timeout, detail)
    }

    pub fn service(status: u16, detail: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Service { status }, detail)
    }

    pub fn decode(detail: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Decode, detail)
    }

    /// Human-readable text for the presentation layer.
    pub fn display_message(&self) -> String {
        match &self.service_message {
            Some(message) if !message.trim().is_empty() => message.clone(),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }
}

/// Error classification, for logs only. Every kind surfaces the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// Connection refused, reset, DNS
    Network,
    Timeout,
    /// Non-success HTTP status
    Service { status: u16 },
    /// Response body did not have the expected shape
    Decode,
}
