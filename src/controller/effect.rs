//! Effects produced by state transitions

use crate::session::{ConversationId, Message};

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Call the up-level endpoint
    RequestUpLevel { prompt: String },

    /// Call the chat endpoint on behalf of `conversation_id`
    RequestChat {
        conversation_id: ConversationId,
        message: String,
        chat_history: Vec<Message>,
    },

    /// Publish the new state to subscribers
    NotifyStateChange,

    /// Hand the prompt draft to the host
    PromptInserted { text: String },
}
