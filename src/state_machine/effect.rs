//! Effects produced by state transitions

use crate::assistant::Message;
use std::time::Duration;

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a user message to the session's thread
    AppendMessage { text: String },

    /// Start the assistant on the session's thread
    CreateRun { assistant_id: String },

    /// Wait `delay`, then refresh the run
    PollRun { run_id: String, delay: Duration },

    /// Fetch the thread's full message list
    FetchHistory,

    /// Replace the cached history
    StoreHistory { messages: Vec<Message> },

    /// Drop the thread and the cached history
    ClearSession,

    /// Ask the host to re-execute the page
    RequestRerun,
}
