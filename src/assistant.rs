//! Remote assistant service abstraction
//!
//! The bridge only talks to the hosted assistant through [`AssistantService`].

mod error;
mod openai;
mod types;

pub use error::{RemoteError, RemoteErrorKind};
pub use openai::{OpenAIAssistants, DEFAULT_BASE_URL};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Operations consumed from the hosted assistant service
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Look up an assistant by identifier
    async fn resolve(&self, assistant_id: &str) -> Result<Assistant, RemoteError>;

    /// Create an empty conversation thread
    async fn create_thread(&self) -> Result<Thread, RemoteError>;

    /// All messages of a thread, newest first
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>, RemoteError>;

    /// Append a user-authored message to a thread
    async fn create_message(&self, thread_id: &str, text: &str) -> Result<Message, RemoteError>;

    /// Start the assistant on a thread
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, RemoteError>;

    /// Refresh a run
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, RemoteError>;
}

#[async_trait]
impl<T: AssistantService + ?Sized> AssistantService for Arc<T> {
    async fn resolve(&self, assistant_id: &str) -> Result<Assistant, RemoteError> {
        (**self).resolve(assistant_id).await
    }

    async fn create_thread(&self) -> Result<Thread, RemoteError> {
        (**self).create_thread().await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>, RemoteError> {
        (**self).list_messages(thread_id).await
    }

    async fn create_message(&self, thread_id: &str, text: &str) -> Result<Message, RemoteError> {
        (**self).create_message(thread_id, text).await
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, RemoteError> {
        (**self).create_run(thread_id, assistant_id).await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, RemoteError> {
        (**self).get_run(thread_id, run_id).await
    }
}

/// Logging wrapper for assistant services
pub struct LoggingService {
    inner: Arc<dyn AssistantService>,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn AssistantService>) -> Self {
        Self { inner }
    }

    fn record<T>(operation: &'static str, start: Instant, result: &Result<T, RemoteError>) {
        let duration = start.elapsed();
        match result {
            Ok(_) => {
                tracing::debug!(
                    operation,
                    duration_ms = %duration.as_millis(),
                    "Assistant request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    operation,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = e.kind.as_str(),
                    "Assistant request failed"
                );
            }
        }
    }
}

#[async_trait]
impl AssistantService for LoggingService {
    async fn resolve(&self, assistant_id: &str) -> Result<Assistant, RemoteError> {
        let start = Instant::now();
        let result = self.inner.resolve(assistant_id).await;
        Self::record("resolve", start, &result);
        result
    }

    async fn create_thread(&self) -> Result<Thread, RemoteError> {
        let start = Instant::now();
        let result = self.inner.create_thread().await;
        Self::record("create_thread", start, &result);
        result
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>, RemoteError> {
        let start = Instant::now();
        let result = self.inner.list_messages(thread_id).await;
        Self::record("list_messages", start, &result);
        result
    }

    async fn create_message(&self, thread_id: &str, text: &str) -> Result<Message, RemoteError> {
        let start = Instant::now();
        let result = self.inner.create_message(thread_id, text).await;
        Self::record("create_message", start, &result);
        result
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, RemoteError> {
        let start = Instant::now();
        let result = self.inner.create_run(thread_id, assistant_id).await;
        Self::record("create_run", start, &result);
        result
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, RemoteError> {
        let start = Instant::now();
        let result = self.inner.get_run(thread_id, run_id).await;
        Self::record("get_run", start, &result);
        result
    }
}
