//! Interaction controller state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions. The
//! runtime feeds user actions and gateway completions in as events and
//! executes the effects that come back out.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{ClientState, InFlight, Phase, View};
pub use transition::{transition, Outcome, Skip, TransitionResult};
