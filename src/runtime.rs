//! Runtime for the interaction controller
//!
//! A single task owns the `ClientState`, applies events one at a time and
//! executes the resulting effects. Gateway calls run as background tasks
//! whose completions come back as events, so user actions that do not
//! mutate (selection, reset, draft edits) are processed while a request is
//! in flight.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::ControllerRuntime;

use crate::controller::{ClientState, Event, Outcome, Phase, View};
use crate::gateway::{RequestGateway, Transport};
use crate::session::{ConversationId, Session};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Capacity of the command queue between handles and the runtime task
const COMMAND_BUFFER: usize = 32;
/// Capacity of the notification broadcast
const EVENT_BUFFER: usize = 128;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("controller runtime has stopped")]
    Stopped,
}

/// Point-in-time view of the client for the presentation layer.
///
/// Published whole through a watch channel, so a reader never sees a
/// partially applied update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSnapshot {
    pub session: Session,
    pub prompt_draft: String,
    pub follow_up_draft: String,
    pub phase: Phase,
    pub pending: bool,
    pub last_error: Option<String>,
    pub view: View,
    pub improved_prompt: Option<String>,
}

impl ClientSnapshot {
    pub fn new(state: &ClientState, last_error: Option<&str>) -> Self {
        let pending = state.phase.is_pending();
        Self {
            session: state.session.clone(),
            prompt_draft: state.prompt_draft.clone(),
            follow_up_draft: state.follow_up_draft.clone(),
            phase: state.phase.clone(),
            pending,
            // The gateway clears its error when a request starts
            last_error: if pending {
                None
            } else {
                last_error.map(String::from)
            },
            view: state.view(),
            improved_prompt: state.improved_prompt().map(String::from),
        }
    }
}

/// Notifications for streaming subscribers
#[derive(Debug, Clone)]
pub enum ClientEvent {
    StateChange { snapshot: Box<ClientSnapshot> },
    PromptInserted { text: String },
    Error { message: String },
}

/// A user action waiting for its outcome
pub(crate) struct Command {
    pub event: Event,
    pub reply: oneshot::Sender<Outcome>,
}

/// Cloneable handle to a running controller
#[derive(Clone)]
pub struct Controller {
    command_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<ClientSnapshot>,
    broadcast_tx: broadcast::Sender<ClientEvent>,
}

impl Controller {
    /// Start a controller runtime on the current tokio runtime.
    pub fn spawn<T: Transport + 'static>(gateway: Arc<RequestGateway<T>>) -> Self {
        let state = ClientState::new();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(ClientSnapshot::new(&state, None));
        let (broadcast_tx, _) = broadcast::channel(EVENT_BUFFER);

        let runtime = ControllerRuntime::new(
            state,
            gateway,
            command_rx,
            snapshot_tx,
            broadcast_tx.clone(),
        );
        tokio::spawn(runtime.run());

        Self {
            command_tx,
            snapshot_rx,
            broadcast_tx,
        }
    }

    async fn dispatch(&self, event: Event) -> Result<Outcome, RuntimeError> {
        let (reply, outcome) = oneshot::channel();
        self.command_tx
            .send(Command { event, reply })
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        outcome.await.map_err(|_| RuntimeError::Stopped)
    }

    /// Up-level `prompt`. Resolves once the service has answered.
    pub async fn start_up_level(&self, prompt: impl Into<String>) -> Result<Outcome, RuntimeError> {
        self.dispatch(Event::StartUpLevel {
            prompt: prompt.into(),
        })
        .await
    }

    /// Send a follow-up on the active conversation. Resolves once the
    /// service has answered.
    pub async fn send_follow_up(
        &self,
        question: impl Into<String>,
    ) -> Result<Outcome, RuntimeError> {
        self.dispatch(Event::SendFollowUp {
            question: question.into(),
        })
        .await
    }

    pub async fn select_conversation(&self, id: ConversationId) -> Result<Outcome, RuntimeError> {
        self.dispatch(Event::SelectConversation { id }).await
    }

    pub async fn reset_to_new_prompt(&self) -> Result<Outcome, RuntimeError> {
        self.dispatch(Event::ResetToNewPrompt).await
    }

    pub async fn edit_prompt_draft(&self, text: impl Into<String>) -> Result<Outcome, RuntimeError> {
        self.dispatch(Event::EditPromptDraft { text: text.into() })
            .await
    }

    pub async fn edit_follow_up_draft(
        &self,
        text: impl Into<String>,
    ) -> Result<Outcome, RuntimeError> {
        self.dispatch(Event::EditFollowUpDraft { text: text.into() })
            .await
    }

    /// Hand the current prompt draft to subscribers as `PromptInserted`.
    pub async fn insert_prompt(&self) -> Result<Outcome, RuntimeError> {
        self.dispatch(Event::InsertPrompt).await
    }

    pub fn snapshot(&self) -> ClientSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Watch the latest snapshot
    #[allow(dead_code)] // For in-process observers
    pub fn subscribe(&self) -> watch::Receiver<ClientSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Receive notifications published after this call
    pub fn events(&self) -> broadcast::Receiver<ClientEvent> {
        self.broadcast_tx.subscribe()
    }
}
