//! Controller runtime executor

use super::{ClientEvent, ClientSnapshot, Command};
use crate::controller::{transition, ClientState, Effect, Event, Outcome, Phase};
use crate::gateway::{
    decode_chat_reply, ChatRequest, Endpoint, RequestGateway, Transport, UpLevelRequest,
    UpLevelResponse,
};
use crate::session::ConversationId;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Completion queue capacity. At most one request is in flight.
const COMPLETION_BUFFER: usize = 4;

/// Owns the client state and serializes every change to it
pub struct ControllerRuntime<T: Transport + 'static> {
    state: ClientState,
    gateway: Arc<RequestGateway<T>>,
    command_rx: mpsc::Receiver<Command>,
    completion_tx: mpsc::Sender<Event>,
    completion_rx: mpsc::Receiver<Event>,
    snapshot_tx: watch::Sender<ClientSnapshot>,
    broadcast_tx: broadcast::Sender<ClientEvent>,
    /// Caller waiting on the in-flight request
    pending_reply: Option<oneshot::Sender<Outcome>>,
}

impl<T: Transport + 'static> ControllerRuntime<T> {
    pub(crate) fn new(
        state: ClientState,
        gateway: Arc<RequestGateway<T>>,
        command_rx: mpsc::Receiver<Command>,
        snapshot_tx: watch::Sender<ClientSnapshot>,
        broadcast_tx: broadcast::Sender<ClientEvent>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(COMPLETION_BUFFER);
        Self {
            state,
            gateway,
            command_rx,
            completion_tx,
            completion_rx,
            snapshot_tx,
            broadcast_tx,
            pending_reply: None,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Starting controller runtime");

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    // Every handle is gone
                    None => break,
                },
                Some(event) = self.completion_rx.recv() => {
                    self.handle_completion(event);
                }
            }
        }

        tracing::info!("Controller runtime stopped");
    }

    fn handle_command(&mut self, command: Command) {
        let Command { event, reply } = command;

        let result = match transition(&self.state, event) {
            Ok(r) => r,
            Err(skip) => {
                tracing::debug!(reason = %skip, "Operation skipped");
                let _ = reply.send(Outcome::Skipped(skip));
                return;
            }
        };

        self.state = result.new_state;
        let mut started_request = false;
        for effect in result.effects {
            started_request |= matches!(
                effect,
                Effect::RequestUpLevel { .. } | Effect::RequestChat { .. }
            );
            self.execute_effect(effect);
        }

        if started_request {
            self.pending_reply = Some(reply);
        } else {
            let _ = reply.send(Outcome::Succeeded);
        }
    }

    fn handle_completion(&mut self, event: Event) {
        let result = match transition(&self.state, event) {
            Ok(r) => r,
            Err(skip) => {
                tracing::warn!(reason = %skip, "Dropping unexpected completion");
                return;
            }
        };

        self.state = result.new_state;
        for effect in result.effects {
            self.execute_effect(effect);
        }

        if let Some(outcome) = result.resolved {
            if let Outcome::Failed { message } = &outcome {
                let _ = self.broadcast_tx.send(ClientEvent::Error {
                    message: message.clone(),
                });
            }
            if let Some(reply) = self.pending_reply.take() {
                // The caller may have stopped waiting; the commit stands either way
                let _ = reply.send(outcome);
            }
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::RequestUpLevel { prompt } => {
                let gateway = self.gateway.clone();
                let completion_tx = self.completion_tx.clone();

                tokio::spawn(async move {
                    tracing::info!("Requesting up-level");
                    let event = request_up_level(&gateway, prompt).await;
                    let _ = completion_tx.send(event).await;
                });
            }

            Effect::RequestChat {
                conversation_id,
                message,
                chat_history,
            } => {
                let gateway = self.gateway.clone();
                let completion_tx = self.completion_tx.clone();

                tokio::spawn(async move {
                    tracing::info!(
                        conversation_id = %conversation_id,
                        history_len = chat_history.len(),
                        "Requesting follow-up reply"
                    );
                    let request = ChatRequest {
                        message,
                        chat_history,
                    };
                    let event = request_chat(&gateway, conversation_id, request).await;
                    let _ = completion_tx.send(event).await;
                });
            }

            Effect::NotifyStateChange => self.publish(),

            Effect::PromptInserted { text } => {
                tracing::info!(len = text.len(), "Prompt inserted");
                let _ = self.broadcast_tx.send(ClientEvent::PromptInserted { text });
            }
        }
    }

    fn publish(&self) {
        let request_state = self.gateway.state();
        let snapshot = ClientSnapshot::new(&self.state, request_state.last_error());
        self.snapshot_tx.send_replace(snapshot.clone());
        let _ = self.broadcast_tx.send(ClientEvent::StateChange {
            snapshot: Box::new(snapshot),
        });

        if let Phase::Pending { request } = &self.state.phase {
            tracing::debug!(request = ?request, "State published while pending");
        }
    }
}

async fn request_up_level<T: Transport>(gateway: &RequestGateway<T>, prompt: String) -> Event {
    let response = gateway
        .send(Endpoint::UpLevel, &UpLevelRequest { prompt })
        .await
        .and_then(UpLevelResponse::from_value);

    match response {
        Ok(response) => Event::UpLevelSucceeded {
            id: ConversationId::new(),
            improved_prompt: response.improved_prompt,
            created_at: Utc::now(),
        },
        Err(e) => {
            gateway.record_error(&e);
            Event::UpLevelFailed {
                message: e.display_message(),
            }
        }
    }
}

async fn request_chat<T: Transport>(
    gateway: &RequestGateway<T>,
    conversation_id: ConversationId,
    request: ChatRequest,
) -> Event {
    let reply = gateway
        .send(Endpoint::Chat, &request)
        .await
        .and_then(decode_chat_reply);

    match reply {
        Ok(reply) => Event::FollowUpSucceeded { reply },
        Err(e) => {
            tracing::warn!(conversation_id = %conversation_id, error = %e, "Follow-up failed");
            gateway.record_error(&e);
            Event::FollowUpFailed {
                message: e.display_message(),
            }
        }
    }
}
