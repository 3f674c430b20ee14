//! `OpenAI` Assistants v2 implementation

use super::types::{Assistant, Message, Role, Run, RunStatus, Thread};
use super::{AssistantService, RemoteError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Page size used when listing thread messages
const MESSAGE_PAGE_LIMIT: u32 = 100;

/// Client for the Assistants REST API
pub struct OpenAIAssistants {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIAssistants {
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| RemoteError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and decode the JSON body, classifying failures
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, RemoteError> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("OpenAI-Beta", "assistants=v2")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RemoteError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    RemoteError::network(format!("Connection failed: {e}"))
                } else {
                    RemoteError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<OpenAIErrorResponse>(&body)
                .map_or(body, |resp| resp.error.message);
            return Err(RemoteError::from_status(status.as_u16(), &message));
        }

        serde_json::from_str(&body).map_err(|e| {
            RemoteError::unknown(format!("Failed to parse {what}: {e} - body: {body}"))
        })
    }
}

#[async_trait]
impl AssistantService for OpenAIAssistants {
    async fn resolve(&self, assistant_id: &str) -> Result<Assistant, RemoteError> {
        let request = self.client.get(self.url(&format!("assistants/{assistant_id}")));
        let assistant: WireAssistant = self.send(request, "assistant").await?;
        Ok(assistant.into())
    }

    async fn create_thread(&self) -> Result<Thread, RemoteError> {
        let request = self
            .client
            .post(self.url("threads"))
            .json(&serde_json::json!({}));
        let thread: WireThread = self.send(request, "thread").await?;
        Ok(thread.into())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>, RemoteError> {
        let url = self.url(&format!("threads/{thread_id}/messages"));
        let limit = MESSAGE_PAGE_LIMIT.to_string();
        let mut messages = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query = vec![("order", "desc"), ("limit", limit.as_str())];
            if let Some(cursor) = after.as_deref() {
                query.push(("after", cursor));
            }
            let request = self.client.get(&url).query(&query);
            let page: WireMessageList = self.send(request, "message list").await?;

            messages.extend(page.data.into_iter().map(Message::from));

            match (page.has_more, page.last_id) {
                (true, Some(last_id)) => after = Some(last_id),
                _ => break,
            }
        }

        Ok(messages)
    }

    async fn create_message(&self, thread_id: &str, text: &str) -> Result<Message, RemoteError> {
        let request = self
            .client
            .post(self.url(&format!("threads/{thread_id}/messages")))
            .json(&CreateMessageRequest {
                role: "user",
                content: text,
            });
        let message: WireMessage = self.send(request, "message").await?;
        Ok(message.into())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, RemoteError> {
        let request = self
            .client
            .post(self.url(&format!("threads/{thread_id}/runs")))
            .json(&CreateRunRequest { assistant_id });
        let run: WireRun = self.send(request, "run").await?;
        Ok(run.into())
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, RemoteError> {
        let request = self
            .client
            .get(self.url(&format!("threads/{thread_id}/runs/{run_id}")));
        let run: WireRun = self.send(request, "run").await?;
        Ok(run.into())
    }
}

fn timestamp(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
}

// Assistants API wire types

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireAssistant {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    model: String,
}

impl From<WireAssistant> for Assistant {
    fn from(wire: WireAssistant) -> Self {
        Assistant {
            id: wire.id,
            name: wire.name,
            model: wire.model,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireThread {
    id: String,
    #[serde(default)]
    created_at: Option<i64>,
}

impl From<WireThread> for Thread {
    fn from(wire: WireThread) -> Self {
        Thread {
            id: wire.id,
            created_at: timestamp(wire.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireMessageList {
    data: Vec<WireMessage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    id: String,
    role: String,
    #[serde(default)]
    content: Vec<WireContent>,
}

#[derive(Debug, Deserialize)]
struct WireContent {
    r#type: String,
    #[serde(default)]
    text: Option<WireText>,
}

#[derive(Debug, Deserialize)]
struct WireText {
    value: String,
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        // Image and file parts carry no text
        let text = wire
            .content
            .into_iter()
            .filter(|part| part.r#type == "text")
            .filter_map(|part| part.text.map(|t| t.value))
            .collect::<Vec<_>>()
            .join("\n");

        Message {
            id: wire.id,
            role: Role::from_wire(&wire.role),
            text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireRun {
    id: String,
    #[serde(default)]
    assistant_id: String,
    status: RunStatus,
    #[serde(default)]
    completed_at: Option<i64>,
    #[serde(default)]
    last_error: Option<WireRunError>,
}

#[derive(Debug, Deserialize)]
struct WireRunError {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

impl From<WireRun> for Run {
    fn from(wire: WireRun) -> Self {
        Run {
            id: wire.id,
            assistant_id: wire.assistant_id,
            status: wire.status,
            completed_at: timestamp(wire.completed_at),
            last_error: wire.last_error.map(|e| match e.code {
                Some(code) => format!("{code}: {}", e.message),
                None => e.message,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}
