//! Mock collaborators for bridge tests
//!
//! These mocks let the bridge run full passes without network or a browser.

use super::ui::HostUi;
use crate::assistant::{
    Assistant, AssistantService, Message, RemoteError, Role, Run, RunStatus, Thread,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

// ============================================================================
// Mock Assistant Service
// ============================================================================

/// A recorded call to the mock service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Resolve(String),
    CreateThread,
    ListMessages(String),
    CreateMessage { thread_id: String, text: String },
    CreateRun { thread_id: String, assistant_id: String },
    GetRun { thread_id: String, run_id: String },
}

pub fn pending_run(id: &str, status: RunStatus) -> Run {
    Run {
        id: id.to_string(),
        assistant_id: "asst_123".to_string(),
        status,
        completed_at: None,
        last_error: None,
    }
}

pub fn completed_run(id: &str) -> Run {
    Run {
        status: RunStatus::Completed,
        completed_at: Some(Utc::now()),
        ..pending_run(id, RunStatus::Completed)
    }
}

/// Mock service with scripted answers and a call log
pub struct MockAssistantService {
    assistants: Vec<String>,
    threads_created: Mutex<u32>,
    runs_created: Mutex<u32>,
    /// Answers for successive `get_run` calls
    polls: Mutex<VecDeque<Run>>,
    /// Returned by every `list_messages`
    history: Mutex<Vec<Message>>,
    /// One-shot failures keyed by operation name
    failures: Mutex<HashMap<&'static str, RemoteError>>,
    calls: Mutex<Vec<Call>>,
}

impl MockAssistantService {
    pub fn new(assistants: &[&str]) -> Self {
        Self {
            assistants: assistants.iter().map(|a| (*a).to_string()).collect(),
            threads_created: Mutex::new(0),
            runs_created: Mutex::new(0),
            polls: Mutex::new(VecDeque::new()),
            history: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_history(&self, messages: Vec<Message>) {
        *self.history.lock().unwrap() = messages;
    }

    pub fn queue_polls(&self, runs: impl IntoIterator<Item = Run>) {
        self.polls.lock().unwrap().extend(runs);
    }

    /// Make the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: &'static str, error: RemoteError) {
        self.failures.lock().unwrap().insert(operation, error);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, operation: &'static str, call: Call) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().remove(operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AssistantService for MockAssistantService {
    async fn resolve(&self, assistant_id: &str) -> Result<Assistant, RemoteError> {
        self.record("resolve", Call::Resolve(assistant_id.to_string()))?;
        if !self.assistants.iter().any(|a| a == assistant_id) {
            return Err(RemoteError::not_found(format!(
                "No assistant found with id '{assistant_id}'."
            )));
        }
        Ok(Assistant {
            id: assistant_id.to_string(),
            name: Some("Test assistant".to_string()),
            model: "gpt-4o".to_string(),
        })
    }

    async fn create_thread(&self) -> Result<Thread, RemoteError> {
        self.record("create_thread", Call::CreateThread)?;
        let mut created = self.threads_created.lock().unwrap();
        *created += 1;
        Ok(Thread::new(format!("thread_{created}")))
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>, RemoteError> {
        self.record("list_messages", Call::ListMessages(thread_id.to_string()))?;
        Ok(self.history.lock().unwrap().clone())
    }

    async fn create_message(&self, thread_id: &str, text: &str) -> Result<Message, RemoteError> {
        self.record(
            "create_message",
            Call::CreateMessage {
                thread_id: thread_id.to_string(),
                text: text.to_string(),
            },
        )?;
        Ok(Message::new("msg_user", Role::User, text))
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, RemoteError> {
        self.record(
            "create_run",
            Call::CreateRun {
                thread_id: thread_id.to_string(),
                assistant_id: assistant_id.to_string(),
            },
        )?;
        let mut created = self.runs_created.lock().unwrap();
        *created += 1;
        Ok(pending_run(&format!("run_{created}"), RunStatus::Queued))
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, RemoteError> {
        self.record(
            "get_run",
            Call::GetRun {
                thread_id: thread_id.to_string(),
                run_id: run_id.to_string(),
            },
        )?;
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| RemoteError::unknown("No mock run queued"))
    }
}

// ============================================================================
// Scripted UI
// ============================================================================

/// An element drawn during a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drawn {
    Chat { role: Role, text: String },
    Caption(String),
    Button(String),
    Input(String),
}

/// Host that records what was drawn and replays one scripted interaction
#[derive(Debug, Default)]
pub struct ScriptedUi {
    pub drawn: Vec<Drawn>,
    pub reruns: u32,
    click: Option<String>,
    prompt: Option<String>,
}

impl ScriptedUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clicking(mut self, label: &str) -> Self {
        self.click = Some(label.to_string());
        self
    }

    pub fn typing(mut self, text: &str) -> Self {
        self.prompt = Some(text.to_string());
        self
    }

    pub fn chat_lines(&self) -> Vec<(Role, String)> {
        self.drawn
            .iter()
            .filter_map(|d| match d {
                Drawn::Chat { role, text } => Some((*role, text.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn buttons(&self) -> Vec<String> {
        self.drawn
            .iter()
            .filter_map(|d| match d {
                Drawn::Button(label) => Some(label.clone()),
                _ => None,
            })
            .collect()
    }
}

impl HostUi for ScriptedUi {
    fn chat_message(&mut self, role: Role, text: &str) {
        self.drawn.push(Drawn::Chat {
            role,
            text: text.to_string(),
        });
    }

    fn caption(&mut self, text: &str) {
        self.drawn.push(Drawn::Caption(text.to_string()));
    }

    fn button(&mut self, label: &str) -> bool {
        self.drawn.push(Drawn::Button(label.to_string()));
        self.click.as_deref() == Some(label)
    }

    fn chat_input(&mut self, placeholder: &str) -> Option<String> {
        self.drawn.push(Drawn::Input(placeholder.to_string()));
        self.prompt.take()
    }

    fn rerun(&mut self) {
        self.reruns += 1;
    }
}
