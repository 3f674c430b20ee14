//! Events that drive an exchange

use crate::assistant::{Message, Run};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserInput { text: String },
    Reset,

    // Remote events
    MessageAppended { message_id: String },
    RunCreated { run: Run },
    RunPolled { run: Run },
    HistoryFetched { messages: Vec<Message> },

    /// A step failed; the in-flight exchange is dropped
    ExchangeAborted,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::UserInput { .. } => "user_input",
            Event::Reset => "reset",
            Event::MessageAppended { .. } => "message_appended",
            Event::RunCreated { .. } => "run_created",
            Event::RunPolled { .. } => "run_polled",
            Event::HistoryFetched { .. } => "history_fetched",
            Event::ExchangeAborted => "exchange_aborted",
        }
    }
}
