//! Property-based tests for the controller state machine
//!
//! These tests verify key invariants hold across arbitrary event sequences.

use super::*;
use crate::session::{ConversationId, Message};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[ \t\n]{1,4}",
        "[a-zA-Z ]{1,20}",
    ]
}

/// Abstract step; selection picks among existing conversations by index so
/// that generated sequences actually hit known ids.
#[derive(Debug, Clone)]
enum Step {
    StartUpLevel(String),
    SendFollowUp(String),
    Select(usize),
    SelectUnknown,
    Reset,
    EditPrompt(String),
    EditFollowUp(String),
    Insert,
    UpLevelOk(String),
    UpLevelErr,
    FollowUpOk(String),
    FollowUpErr,
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        arb_text().prop_map(Step::StartUpLevel),
        arb_text().prop_map(Step::SendFollowUp),
        (0usize..8).prop_map(Step::Select),
        Just(Step::SelectUnknown),
        Just(Step::Reset),
        arb_text().prop_map(Step::EditPrompt),
        arb_text().prop_map(Step::EditFollowUp),
        Just(Step::Insert),
        "[a-z]{1,10}".prop_map(Step::UpLevelOk),
        Just(Step::UpLevelErr),
        "[a-z]{1,10}".prop_map(Step::FollowUpOk),
        Just(Step::FollowUpErr),
    ]
}

fn to_event(state: &ClientState, step: Step, seq: i64) -> Event {
    match step {
        Step::StartUpLevel(prompt) => Event::StartUpLevel { prompt },
        Step::SendFollowUp(question) => Event::SendFollowUp { question },
        Step::Select(i) => {
            let conversations = state.session.conversations();
            match conversations.get(i % conversations.len().max(1)) {
                Some(c) => Event::SelectConversation { id: c.id() },
                None => Event::SelectConversation {
                    id: ConversationId::new(),
                },
            }
        }
        Step::SelectUnknown => Event::SelectConversation {
            id: ConversationId::new(),
        },
        Step::Reset => Event::ResetToNewPrompt,
        Step::EditPrompt(text) => Event::EditPromptDraft { text },
        Step::EditFollowUp(text) => Event::EditFollowUpDraft { text },
        Step::Insert => Event::InsertPrompt,
        Step::UpLevelOk(improved_prompt) => Event::UpLevelSucceeded {
            id: ConversationId::new(),
            improved_prompt,
            created_at: Utc.timestamp_opt(seq, 0).single().unwrap_or_default(),
        },
        Step::UpLevelErr => Event::UpLevelFailed {
            message: "failed".to_string(),
        },
        Step::FollowUpOk(reply) => Event::FollowUpSucceeded { reply },
        Step::FollowUpErr => Event::FollowUpFailed {
            message: "failed".to_string(),
        },
    }
}

fn check_invariants(state: &ClientState) {
    let ids: HashSet<_> = state.session.conversations().iter().map(|c| c.id()).collect();
    assert_eq!(ids.len(), state.session.conversations().len(), "conversation ids must be unique");

    if let Some(active) = state.session.active_conversation_id() {
        assert!(ids.contains(&active), "active id must reference a conversation");
    }

    if let Phase::Pending {
        request: InFlight::FollowUp { conversation_id, .. },
    } = &state.phase
    {
        assert!(ids.contains(conversation_id), "follow-up target must exist");
    }
}

/// `after` must extend `before` without reordering or rewriting anything
fn is_append_only(before: &[Message], after: &[Message]) -> bool {
    after.len() >= before.len() && after[..before.len()] == *before
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn invariants_hold_for_any_sequence(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let mut state = ClientState::new();
        for (seq, step) in steps.into_iter().enumerate() {
            let event = to_event(&state, step, seq as i64);
            if let Ok(result) = transition(&state, event) {
                for before in state.session.conversations() {
                    let after = result.new_state.session.get(before.id());
                    prop_assert!(after.is_some(), "conversations are never removed");
                    let after = after.unwrap();
                    prop_assert!(is_append_only(before.messages(), after.messages()));
                    prop_assert_eq!(before.improved_prompt(), after.improved_prompt());
                }
                state = result.new_state;
            }
            check_invariants(&state);
        }
    }

    #[test]
    fn blank_input_never_changes_state(
        steps in proptest::collection::vec(arb_step(), 0..20),
        blank in "[ \t\n]{0,4}",
    ) {
        let mut state = ClientState::new();
        for (seq, step) in steps.into_iter().enumerate() {
            let event = to_event(&state, step, seq as i64);
            if let Ok(result) = transition(&state, event) {
                state = result.new_state;
            }
        }

        let up = transition(&state, Event::StartUpLevel { prompt: blank.clone() });
        prop_assert_eq!(up.unwrap_err(), Skip::EmptyInput);
        let follow = transition(&state, Event::SendFollowUp { question: blank });
        prop_assert_eq!(follow.unwrap_err(), Skip::EmptyInput);
    }

    #[test]
    fn at_most_one_request_in_flight(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let mut state = ClientState::new();
        for (seq, step) in steps.into_iter().enumerate() {
            let was_pending = state.phase.is_pending();
            let event = to_event(&state, step, seq as i64);
            if let Ok(result) = transition(&state, event) {
                let requests = result
                    .effects
                    .iter()
                    .filter(|e| matches!(e, Effect::RequestUpLevel { .. } | Effect::RequestChat { .. }))
                    .count();
                prop_assert!(requests <= 1);
                if was_pending {
                    prop_assert_eq!(requests, 0, "no new request while one is pending");
                }
                if requests == 1 {
                    prop_assert!(result.new_state.phase.is_pending());
                }
                state = result.new_state;
            }
        }
    }

    #[test]
    fn follow_ups_append_in_order(questions in proptest::collection::vec("[a-z]{1,8}", 1..6)) {
        let mut state = transition(&ClientState::new(), Event::StartUpLevel { prompt: "p".into() })
            .unwrap()
            .new_state;
        state = transition(&state, Event::UpLevelSucceeded {
            id: ConversationId::new(),
            improved_prompt: "better".into(),
            created_at: Utc::now(),
        })
        .unwrap()
        .new_state;
        let id = state.session.active_conversation_id().unwrap();

        let mut expected = Vec::new();
        for q in &questions {
            state = transition(&state, Event::SendFollowUp { question: q.clone() }).unwrap().new_state;
            let reply = format!("re: {q}");
            state = transition(&state, Event::FollowUpSucceeded { reply: reply.clone() }).unwrap().new_state;
            expected.push(Message::user(q.clone()));
            expected.push(Message::assistant(reply));
        }

        prop_assert_eq!(state.session.get(id).unwrap().messages(), expected.as_slice());
    }
}
