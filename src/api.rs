//! Web host for the conversation bridge
//!
//! Every request runs one pass of the page against the caller's session.

mod handlers;
mod page;
mod types;

pub use handlers::create_router;

use crate::assistant::LoggingService;
use crate::bridge::ConversationBridge;
use crate::session::SessionStore;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<ConversationBridge<LoggingService>>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(bridge: ConversationBridge<LoggingService>, session_idle: Duration) -> Self {
        Self {
            bridge: Arc::new(bridge),
            sessions: Arc::new(SessionStore::new(session_idle)),
        }
    }
}
