//! Exchange state types

use crate::config::PollPolicy;
use serde::Serialize;

/// Where a session's current exchange stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExchangePhase {
    /// Ready for user input, no exchange in flight
    #[default]
    Idle,

    /// Utterance accepted; `message_id` is set once the append succeeded
    Submitted {
        utterance: String,
        message_id: Option<String>,
    },

    /// Run started, waiting for its completion timestamp
    Polling { run_id: String, polls: u32 },

    /// Run finished, history refetch pending
    Completed { run_id: String },
}

impl ExchangePhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, ExchangePhase::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExchangePhase::Idle => "idle",
            ExchangePhase::Submitted { .. } => "submitted",
            ExchangePhase::Polling { .. } => "polling",
            ExchangePhase::Completed { .. } => "completed",
        }
    }
}

/// Immutable configuration consulted by transitions
#[derive(Debug, Clone)]
pub struct BridgeContext {
    pub assistant_id: String,
    pub poll: PollPolicy,
}

impl BridgeContext {
    pub fn new(assistant_id: impl Into<String>, poll: PollPolicy) -> Self {
        Self {
            assistant_id: assistant_id.into(),
            poll,
        }
    }
}
