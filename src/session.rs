//! Session store
//!
//! Holds the ordered list of conversations (most recent first) and the
//! identity of the active one. The store is a plain value: the runtime owns
//! it and is the only mutator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Number of prompt characters shown in a conversation title.
const TITLE_CHARS: usize = 30;

/// Opaque conversation identifier, unique within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(Uuid);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ConversationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// A single chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
        }
    }
}

/// An up-leveled prompt and the follow-up exchange anchored to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    id: ConversationId,
    original_prompt: String,
    improved_prompt: String,
    messages: Vec<Message>,
    created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(
        id: ConversationId,
        original_prompt: impl Into<String>,
        improved_prompt: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            original_prompt: original_prompt.into(),
            improved_prompt: improved_prompt.into(),
            messages: Vec::new(),
            created_at,
        }
    }

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn original_prompt(&self) -> &str {
        &self.original_prompt
    }

    pub fn improved_prompt(&self) -> &str {
        &self.improved_prompt
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Sidebar label: the start of the original prompt followed by an ellipsis.
    pub fn title(&self) -> String {
        let preview: String = self.original_prompt.chars().take(TITLE_CHARS).collect();
        format!("{preview}...")
    }

    /// Return a copy extended with one user/assistant exchange.
    pub fn with_exchange(&self, question: impl Into<String>, reply: impl Into<String>) -> Self {
        let mut messages = Vec::with_capacity(self.messages.len() + 2);
        messages.extend_from_slice(&self.messages);
        messages.push(Message::user(question));
        messages.push(Message::assistant(reply));
        Self {
            messages,
            ..self.clone()
        }
    }
}

impl Serialize for Conversation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire<'a> {
            id: ConversationId,
            title: String,
            original_prompt: &'a str,
            improved_prompt: &'a str,
            messages: &'a [Message],
            created_at: DateTime<Utc>,
        }
        Wire {
            id: self.id(),
            title: self.title(),
            original_prompt: self.original_prompt(),
            improved_prompt: self.improved_prompt(),
            messages: self.messages(),
            created_at: self.created_at(),
        }
        .serialize(serializer)
    }
}

/// Errors from session mutations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("conversation {0} already exists")]
    DuplicateId(ConversationId),
    #[error("conversation {0} not found")]
    UnknownConversation(ConversationId),
}

/// The set of conversations for the running client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    conversations: Vec<Conversation>,
    active_conversation_id: Option<ConversationId>,
}

impl Session {
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn active_conversation_id(&self) -> Option<ConversationId> {
        self.active_conversation_id
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active_conversation_id.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: ConversationId) -> bool {
        self.get(id).is_some()
    }

    /// Put a new conversation at the front of the list and make it active.
    pub fn start_conversation(&mut self, conversation: Conversation) -> Result<(), SessionError> {
        if self.contains(conversation.id) {
            return Err(SessionError::DuplicateId(conversation.id));
        }
        self.active_conversation_id = Some(conversation.id);
        self.conversations.insert(0, conversation);
        Ok(())
    }

    /// Replace the conversation with `id` by a copy extended with one exchange.
    ///
    /// The target is looked up by id in the current list, so the exchange lands
    /// on that conversation regardless of which one is active.
    pub fn append_exchange(
        &mut self,
        id: ConversationId,
        question: &str,
        reply: &str,
    ) -> Result<(), SessionError> {
        let slot = self
            .conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(SessionError::UnknownConversation(id))?;
        *slot = slot.with_exchange(question, reply);
        Ok(())
    }

    /// Make `id` active. Returns false (and changes nothing) if it is unknown.
    pub fn select(&mut self, id: ConversationId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.active_conversation_id = Some(id);
        true
    }

    pub fn clear_active(&mut self) {
        self.active_conversation_id = None;
    }
}
