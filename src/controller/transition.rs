//! Pure state transition function
//!
//! Validation failures are reported as a `Skip` and leave the state
//! untouched. Only completion events end a pending request.

use super::{ClientState, Effect, Event, InFlight, Phase};
use crate::session::Conversation;
use thiserror::Error;

/// Why an operation was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Skip {
    #[error("input is empty")]
    EmptyInput,
    #[error("no active conversation")]
    NoActiveConversation,
    #[error("a request is already pending")]
    RequestPending,
    #[error("conversation not found")]
    UnknownConversation,
    #[error("no matching request in flight")]
    NoRequestInFlight,
}

impl Skip {
    /// Stable machine-readable name
    pub fn as_str(self) -> &'static str {
        match self {
            Skip::EmptyInput => "empty_input",
            Skip::NoActiveConversation => "no_active_conversation",
            Skip::RequestPending => "request_pending",
            Skip::UnknownConversation => "unknown_conversation",
            Skip::NoRequestInFlight => "no_request_in_flight",
        }
    }
}

/// Result of a controller operation as seen by its caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Skipped(Skip),
    Failed { message: String },
}

impl Outcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Outcome::Failed {
            message: message.into(),
        }
    }
}

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ClientState,
    pub effects: Vec<Effect>,
    /// Set when this transition resolves the pending request
    pub resolved: Option<Outcome>,
}

impl TransitionResult {
    pub fn new(state: ClientState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
            resolved: None,
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn resolving(mut self, outcome: Outcome) -> Self {
        self.resolved = Some(outcome);
        self
    }
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Pure transition function: no I/O, no clock, no randomness.
pub fn transition(state: &ClientState, event: Event) -> Result<TransitionResult, Skip> {
    match event {
        Event::StartUpLevel { prompt } => {
            if is_blank(&prompt) {
                return Err(Skip::EmptyInput);
            }
            if state.phase.is_pending() {
                return Err(Skip::RequestPending);
            }
            let mut next = state.clone();
            next.phase = Phase::Pending {
                request: InFlight::UpLevel {
                    prompt: prompt.clone(),
                },
            };
            Ok(TransitionResult::new(next)
                .with_effect(Effect::RequestUpLevel { prompt })
                .with_effect(Effect::NotifyStateChange))
        }

        Event::SendFollowUp { question } => {
            if is_blank(&question) {
                return Err(Skip::EmptyInput);
            }
            let active = state.session.active().ok_or(Skip::NoActiveConversation)?;
            if state.phase.is_pending() {
                return Err(Skip::RequestPending);
            }
            let conversation_id = active.id();
            let chat_history = active.messages().to_vec();
            let mut next = state.clone();
            next.phase = Phase::Pending {
                request: InFlight::FollowUp {
                    conversation_id,
                    question: question.clone(),
                },
            };
            Ok(TransitionResult::new(next)
                .with_effect(Effect::RequestChat {
                    conversation_id,
                    message: question,
                    chat_history,
                })
                .with_effect(Effect::NotifyStateChange))
        }

        // Selection and reset are allowed while pending; the in-flight
        // request keeps its own target.
        Event::SelectConversation { id } => {
            let mut next = state.clone();
            if !next.session.select(id) {
                return Err(Skip::UnknownConversation);
            }
            Ok(TransitionResult::new(next).with_effect(Effect::NotifyStateChange))
        }

        Event::ResetToNewPrompt => {
            let mut next = state.clone();
            next.prompt_draft.clear();
            next.session.clear_active();
            Ok(TransitionResult::new(next).with_effect(Effect::NotifyStateChange))
        }

        Event::EditPromptDraft { text } => {
            let mut next = state.clone();
            next.prompt_draft = text;
            Ok(TransitionResult::new(next).with_effect(Effect::NotifyStateChange))
        }

        Event::EditFollowUpDraft { text } => {
            let mut next = state.clone();
            next.follow_up_draft = text;
            Ok(TransitionResult::new(next).with_effect(Effect::NotifyStateChange))
        }

        Event::InsertPrompt => {
            if is_blank(&state.prompt_draft) {
                return Err(Skip::EmptyInput);
            }
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::PromptInserted {
                text: state.prompt_draft.clone(),
            }))
        }

        Event::UpLevelSucceeded {
            id,
            improved_prompt,
            created_at,
        } => {
            let Phase::Pending {
                request: InFlight::UpLevel { prompt },
            } = &state.phase
            else {
                return Err(Skip::NoRequestInFlight);
            };
            let mut next = state.clone();
            next.phase = Phase::Idle;
            let conversation = Conversation::new(id, prompt.clone(), improved_prompt, created_at);
            let outcome = match next.session.start_conversation(conversation) {
                Ok(()) => {
                    // A draft typed after submitting is kept
                    if next.prompt_draft == *prompt {
                        next.prompt_draft.clear();
                    }
                    Outcome::Succeeded
                }
                Err(e) => Outcome::failed(e.to_string()),
            };
            Ok(TransitionResult::new(next)
                .with_effect(Effect::NotifyStateChange)
                .resolving(outcome))
        }

        Event::UpLevelFailed { message } => {
            if !matches!(
                state.phase,
                Phase::Pending {
                    request: InFlight::UpLevel { .. }
                }
            ) {
                return Err(Skip::NoRequestInFlight);
            }
            let mut next = state.clone();
            next.phase = Phase::Idle;
            Ok(TransitionResult::new(next)
                .with_effect(Effect::NotifyStateChange)
                .resolving(Outcome::failed(message)))
        }

        Event::FollowUpSucceeded { reply } => {
            let Phase::Pending {
                request:
                    InFlight::FollowUp {
                        conversation_id,
                        question,
                    },
            } = &state.phase
            else {
                return Err(Skip::NoRequestInFlight);
            };
            let mut next = state.clone();
            next.phase = Phase::Idle;
            let outcome = match next
                .session
                .append_exchange(*conversation_id, question, &reply)
            {
                Ok(()) => {
                    if next.follow_up_draft == *question {
                        next.follow_up_draft.clear();
                    }
                    Outcome::Succeeded
                }
                Err(e) => Outcome::failed(e.to_string()),
            };
            Ok(TransitionResult::new(next)
                .with_effect(Effect::NotifyStateChange)
                .resolving(outcome))
        }

        Event::FollowUpFailed { message } => {
            if !matches!(
                state.phase,
                Phase::Pending {
                    request: InFlight::FollowUp { .. }
                }
            ) {
                return Err(Skip::NoRequestInFlight);
            }
            let mut next = state.clone();
            next.phase = Phase::Idle;
            Ok(TransitionResult::new(next)
                .with_effect(Effect::NotifyStateChange)
                .resolving(Outcome::failed(message)))
        }
    }
}
