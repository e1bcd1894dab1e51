//! Client state owned by the interaction controller

use crate::session::{ConversationId, Session};
use serde::Serialize;

/// What a pending request will commit into when it resolves
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InFlight {
    UpLevel {
        prompt: String,
    },
    /// The target conversation is fixed when the request is issued
    FollowUp {
        conversation_id: ConversationId,
        question: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Pending { request: InFlight },
}

impl Phase {
    pub fn is_pending(&self) -> bool {
        matches!(self, Phase::Pending { .. })
    }
}

/// Which main pane the presentation layer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Prompt entry form
    Compose,
    /// Original/improved prompt and the follow-up chat
    Conversation,
}

/// Everything the controller owns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientState {
    pub session: Session,
    pub prompt_draft: String,
    pub follow_up_draft: String,
    pub phase: Phase,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        if self.session.active().is_some() {
            View::Conversation
        } else {
            View::Compose
        }
    }

    /// Improved prompt of the active conversation, if any
    pub fn improved_prompt(&self) -> Option<&str> {
        self.session.active().map(|c| c.improved_prompt())
    }
}
