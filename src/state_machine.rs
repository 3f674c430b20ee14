//! Exchange state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions: every
//! UI action and every remote answer is an [`Event`], [`transition`] maps the
//! current phase and the event to a new phase plus the [`Effect`]s to run.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{BridgeContext, ExchangePhase};
pub use transition::{transition, TransitionError};
