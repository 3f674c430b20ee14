//! Bridge error types

use crate::assistant::RemoteError;
use crate::state_machine::TransitionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Assistant {0} not found")]
    AssistantNotFound(String),
    #[error("Assistant service error: {0}")]
    Remote(#[from] RemoteError),
    #[error("Session state corrupted: {0}")]
    StateCorruption(&'static str),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Exchange cancelled")]
    Cancelled,
}
