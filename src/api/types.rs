//! API request and response types

use crate::controller::Outcome;
use serde::{Deserialize, Serialize};

/// Request to up-level a prompt
#[derive(Debug, Deserialize)]
pub struct UpLevelRequest {
    pub prompt: String,
}

/// Request to send a follow-up question
#[derive(Debug, Deserialize)]
pub struct FollowUpRequest {
    pub question: String,
}

/// Request to replace a draft field
#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub text: String,
}

/// Result of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OutcomeResponse {
    Succeeded,
    Skipped { reason: String },
    Failed { message: String },
}

impl From<Outcome> for OutcomeResponse {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Succeeded => OutcomeResponse::Succeeded,
            Outcome::Skipped(skip) => OutcomeResponse::Skipped {
                reason: skip.as_str().to_string(),
            },
            Outcome::Failed { message } => OutcomeResponse::Failed { message },
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
