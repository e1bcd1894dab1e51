//! Events the controller reacts to

use crate::session::ConversationId;
use chrono::{DateTime, Utc};

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    StartUpLevel {
        prompt: String,
    },
    SendFollowUp {
        question: String,
    },
    SelectConversation {
        id: ConversationId,
    },
    ResetToNewPrompt,
    EditPromptDraft {
        text: String,
    },
    EditFollowUpDraft {
        text: String,
    },
    InsertPrompt,

    // Gateway completions
    UpLevelSucceeded {
        /// Fresh id for the conversation about to be created
        id: ConversationId,
        improved_prompt: String,
        created_at: DateTime<Utc>,
    },
    UpLevelFailed {
        message: String,
    },
    FollowUpSucceeded {
        reply: String,
    },
    FollowUpFailed {
        message: String,
    },
}
