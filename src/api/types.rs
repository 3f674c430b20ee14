//! Request and response types of the web host

use crate::assistant::Message;
use crate::state_machine::ExchangePhase;
use serde::{Deserialize, Serialize};

/// Form posted by the page: a clicked button, a typed prompt, or both
#[derive(Debug, Default, Deserialize)]
pub struct PassForm {
    #[serde(default)]
    pub button: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Snapshot of a session's cached conversation
#[derive(Debug, Serialize)]
pub struct HistoryResponse<'a> {
    pub assistant_id: &'a str,
    pub thread_id: Option<&'a str>,
    pub phase: &'a ExchangePhase,
    /// Newest first, exactly as cached
    pub messages: &'a [Message],
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
