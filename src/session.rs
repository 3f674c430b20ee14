//! Session-scoped state
//!
//! A [`SessionContext`] holds everything that must survive between passes of
//! one UI session: the thread handle, the cached history and the phase of the
//! exchange in flight. It is passed explicitly into every bridge operation.

use crate::assistant::{Message, Thread};
use crate::state_machine::ExchangePhase;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct SessionContext {
    thread: Option<Thread>,
    /// `None` until the history of `thread` has been loaded
    messages: Option<Vec<Message>>,
    phase: ExchangePhase,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a freshly created thread; its history is not loaded yet.
    pub fn create(&mut self, thread: Thread) {
        self.thread = Some(thread);
        self.messages = None;
        self.phase = ExchangePhase::Idle;
    }

    pub fn thread(&self) -> Option<&Thread> {
        self.thread.as_ref()
    }

    /// Cached history, newest first; empty until loaded
    pub fn messages(&self) -> &[Message] {
        self.messages.as_deref().unwrap_or_default()
    }

    pub fn history_loaded(&self) -> bool {
        self.messages.is_some()
    }

    /// Replace (never merge) the cached history
    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        self.messages = Some(messages);
    }

    pub fn phase(&self) -> &ExchangePhase {
        &self.phase
    }

    pub fn set_phase(&mut self, phase: ExchangePhase) {
        self.phase = phase;
    }

    /// Forget the thread and everything cached for it
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

struct SessionEntry {
    context: Arc<Mutex<SessionContext>>,
    last_seen: Instant,
}

/// In-memory store of session contexts keyed by session id.
///
/// Sessions not seen for `idle_timeout` are dropped the next time a session
/// is created, unless a pass still holds them.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Look up a session, creating it under a new id when `id` is unknown.
    /// Returns the id in use and whether it was created.
    pub async fn get_or_create(&self, id: Option<&str>) -> (String, Arc<Mutex<SessionContext>>, bool) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        if let Some(id) = id {
            if let Some(entry) = sessions.get_mut(id) {
                entry.last_seen = now;
                return (id.to_string(), Arc::clone(&entry.context), false);
            }
        }

        let before = sessions.len();
        sessions.retain(|_, entry| {
            now.duration_since(entry.last_seen) < self.idle_timeout
                || Arc::strong_count(&entry.context) > 1
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, active = sessions.len(), "Idle sessions evicted");
        }

        let id = uuid::Uuid::new_v4().to_string();
        let context = Arc::new(Mutex::new(SessionContext::new()));
        sessions.insert(
            id.clone(),
            SessionEntry {
                context: Arc::clone(&context),
                last_seen: now,
            },
        );
        tracing::info!(session_id = %id, active = sessions.len(), "Session started");
        (id, context, true)
    }

    /// Peek at a session without refreshing its idle timer
    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<SessionContext>>> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|entry| Arc::clone(&entry.context))
    }
}
