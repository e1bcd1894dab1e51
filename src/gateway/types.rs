//! Wire types for the remote up-level and chat operations

use super::GatewayError;
use crate::session::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Remote operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    UpLevel,
    Chat,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::UpLevel => "/api/uplevel",
            Endpoint::Chat => "/api/chat",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::UpLevel => f.write_str("uplevel"),
            Endpoint::Chat => f.write_str("chat"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpLevelRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpLevelResponse {
    pub improved_prompt: String,
}

impl UpLevelResponse {
    pub fn from_value(value: Value) -> Result<Self, GatewayError> {
        serde_json::from_value(value)
            .map_err(|e| GatewayError::decode(format!("Invalid up-level response: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub chat_history: Vec<Message>,
}

/// Field names a chat reply object may carry its text under.
const REPLY_FIELDS: &[&str] = &["response", "reply", "message"];

/// Extract the assistant's reply text from a chat response.
///
/// Accepts a bare string, an object with a `response`/`reply`/`message`
/// string field, or an object with exactly one string field.
pub fn decode_chat_reply(value: Value) -> Result<String, GatewayError> {
    let reply = match value {
        Value::String(text) => Some(text),
        Value::Object(map) => {
            let named = REPLY_FIELDS
                .iter()
                .find_map(|field| map.get(*field).and_then(Value::as_str));
            match named {
                Some(text) => Some(text.to_string()),
                None if map.len() == 1 => map.values().next().and_then(Value::as_str).map(String::from),
                None => None,
            }
        }
        _ => None,
    };

    match reply {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err(GatewayError::decode("Empty chat reply")),
        None => Err(GatewayError::decode("Chat response has no reply text")),
    }
}
