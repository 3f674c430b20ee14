//! Conversation bridge
//!
//! Ties a session context, the exchange state machine, the remote assistant
//! and the page host together. One call to [`ConversationBridge::run_pass`] is
//! one rerun of the page: bootstrap, draw history, draw controls, capture
//! input, exchange.

mod error;
#[cfg(test)]
pub mod testing;
mod ui;

pub use error::BridgeError;
pub use ui::{ControlAction, HostUi};

use crate::assistant::{Assistant, AssistantService};
use crate::config::{BridgeConfig, QuickReply};
use crate::session::SessionContext;
use crate::state_machine::{transition, BridgeContext, Effect, Event, TransitionError};
use tokio_util::sync::CancellationToken;

pub const RESET_LABEL: &str = "🔄 Start a new conversation";

/// Outcome of dispatching an event
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Dispatched {
    pub rerun_requested: bool,
}

pub struct ConversationBridge<A: AssistantService> {
    service: A,
    assistant: Assistant,
    context: BridgeContext,
    prompt_text: String,
    buttons: Vec<QuickReply>,
    /// Cancels any wait between polls
    cancel: CancellationToken,
}

impl<A: AssistantService> ConversationBridge<A> {
    /// Resolve the configured assistant and build a bridge for it
    pub async fn connect(service: A, config: BridgeConfig) -> Result<Self, BridgeError> {
        let assistant_id = config.assistant_id.trim().to_string();
        if assistant_id.is_empty() {
            return Err(BridgeError::Configuration(
                "assistant identifier is empty".to_string(),
            ));
        }

        let assistant = service.resolve(&assistant_id).await.map_err(|e| {
            if e.is_not_found() {
                BridgeError::AssistantNotFound(assistant_id.clone())
            } else {
                BridgeError::Remote(e)
            }
        })?;
        tracing::info!(
            assistant_id = %assistant.id,
            model = %assistant.model,
            buttons = config.buttons.len(),
            "Assistant resolved"
        );

        Ok(Self {
            context: BridgeContext::new(assistant.id.clone(), config.poll),
            service,
            assistant,
            prompt_text: config.prompt_text,
            buttons: config.buttons,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    /// Ensure the session has a thread and a loaded history.
    ///
    /// Idempotent: once both exist no remote call is made.
    pub async fn bootstrap(&self, session: &mut SessionContext) -> Result<(), BridgeError> {
        if session.thread().is_none() {
            let thread = self.service.create_thread().await?;
            tracing::info!(thread_id = %thread.id, "Thread created");
            session.create(thread);
        }

        if !session.history_loaded() {
            let thread_id = thread_id(session)?;
            let messages = self.service.list_messages(thread_id).await?;
            tracing::debug!(thread_id, count = messages.len(), "History loaded");
            session.replace_messages(messages);
        }

        // Passes hold the session for their whole duration, so a phase other
        // than idle here means the previous pass was dropped mid-exchange.
        if !session.phase().is_idle() {
            tracing::warn!(phase = session.phase().name(), "Discarding interrupted exchange");
            self.abort(session);
        }

        Ok(())
    }

    /// Draw the cached history, most recent on top
    pub fn render_history(&self, session: &SessionContext, ui: &mut impl HostUi) {
        for message in session.messages() {
            ui.chat_message(message.role, &message.text);
        }
    }

    /// Draw the reset control and the quick-reply buttons
    pub fn render_controls(&self, ui: &mut impl HostUi) -> ControlAction {
        ui.caption(&format!("Assistant ID {}", self.assistant.id));

        if ui.button(RESET_LABEL) {
            return ControlAction::Reset;
        }

        let mut action = ControlAction::None;
        for button in &self.buttons {
            if ui.button(&button.label) {
                action = ControlAction::Staged(button.payload.clone());
            }
        }
        action
    }

    /// Next utterance: a staged button payload beats the typed prompt
    pub fn capture_input(&self, ui: &mut impl HostUi, staged: Option<String>) -> Option<String> {
        let prompt = ui.chat_input(&self.prompt_text);
        let present = |text: &String| !text.trim().is_empty();
        staged.filter(present).or_else(|| prompt.filter(present))
    }

    /// Submit an utterance and wait for the assistant's reply
    pub async fn exchange(
        &self,
        session: &mut SessionContext,
        utterance: &str,
    ) -> Result<(), BridgeError> {
        tracing::info!(
            thread_id = session.thread().map(|t| t.id.as_str()),
            chars = utterance.chars().count(),
            "Submitting user input"
        );
        self.dispatch(
            session,
            Event::UserInput {
                text: utterance.to_string(),
            },
        )
        .await?;
        Ok(())
    }

    /// Drop the thread and history; the host must rerun afterwards
    pub async fn reset(&self, session: &mut SessionContext) -> Result<Dispatched, BridgeError> {
        self.dispatch(session, Event::Reset).await
    }

    /// One full pass of the page
    pub async fn run_pass(
        &self,
        session: &mut SessionContext,
        ui: &mut impl HostUi,
    ) -> Result<(), BridgeError> {
        self.bootstrap(session).await?;
        self.render_history(session, ui);

        let staged = match self.render_controls(ui) {
            ControlAction::Reset => {
                if self.reset(session).await?.rerun_requested {
                    ui.rerun();
                }
                return Ok(());
            }
            ControlAction::Staged(payload) => Some(payload),
            ControlAction::None => None,
        };

        match self.capture_input(ui, staged) {
            Some(utterance) => self.exchange(session, &utterance).await,
            None => Ok(()),
        }
    }

    /// Feed an event through the state machine, executing effects until the
    /// chain settles. Any failure leaves the session idle and is returned.
    pub async fn dispatch(
        &self,
        session: &mut SessionContext,
        event: Event,
    ) -> Result<Dispatched, BridgeError> {
        let mut outcome = Dispatched::default();
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = match transition(session.phase(), &self.context, current_event) {
                Ok(r) => r,
                Err(e) => {
                    // Rejected input leaves the exchange in flight alone
                    if !matches!(
                        e,
                        TransitionError::EmptyUtterance | TransitionError::ExchangeInProgress
                    ) {
                        self.abort(session);
                    }
                    return Err(e.into());
                }
            };

            session.set_phase(result.new_phase);

            for effect in result.effects {
                match self.execute_effect(session, effect, &mut outcome).await {
                    Ok(Some(generated_event)) => events_to_process.push(generated_event),
                    Ok(None) => {}
                    Err(e) => {
                        self.abort(session);
                        return Err(e);
                    }
                }
            }
        }

        Ok(outcome)
    }

    fn abort(&self, session: &mut SessionContext) {
        if let Ok(result) = transition(session.phase(), &self.context, Event::ExchangeAborted) {
            session.set_phase(result.new_phase);
        }
    }

    async fn execute_effect(
        &self,
        session: &mut SessionContext,
        effect: Effect,
        outcome: &mut Dispatched,
    ) -> Result<Option<Event>, BridgeError> {
        match effect {
            Effect::AppendMessage { text } => {
                let thread_id = thread_id(session)?;
                let message = self.service.create_message(thread_id, &text).await?;
                tracing::debug!(thread_id, message_id = %message.id, "User message appended");
                Ok(Some(Event::MessageAppended {
                    message_id: message.id,
                }))
            }

            Effect::CreateRun { assistant_id } => {
                let thread_id = thread_id(session)?;
                let run = self.service.create_run(thread_id, &assistant_id).await?;
                tracing::info!(thread_id, run_id = %run.id, status = %run.status, "Run created");
                Ok(Some(Event::RunCreated { run }))
            }

            Effect::PollRun { run_id, delay } => {
                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    () = self.cancel.cancelled() => {
                        tracing::warn!(run_id = %run_id, "Polling cancelled");
                        return Err(BridgeError::Cancelled);
                    }
                }
                let thread_id = thread_id(session)?;
                let run = self.service.get_run(thread_id, &run_id).await?;
                tracing::debug!(
                    run_id = %run.id,
                    status = %run.status,
                    complete = run.is_complete(),
                    "Run polled"
                );
                Ok(Some(Event::RunPolled { run }))
            }

            Effect::FetchHistory => {
                let thread_id = thread_id(session)?;
                let messages = self.service.list_messages(thread_id).await?;
                tracing::info!(thread_id, count = messages.len(), "History refreshed");
                Ok(Some(Event::HistoryFetched { messages }))
            }

            Effect::StoreHistory { messages } => {
                session.replace_messages(messages);
                Ok(None)
            }

            Effect::ClearSession => {
                tracing::info!(
                    thread_id = session.thread().map(|t| t.id.as_str()),
                    "Session reset"
                );
                session.clear();
                Ok(None)
            }

            Effect::RequestRerun => {
                outcome.rerun_requested = true;
                Ok(None)
            }
        }
    }
}

fn thread_id(session: &SessionContext) -> Result<&str, BridgeError> {
    session
        .thread()
        .map(|t| t.id.as_str())
        .ok_or(BridgeError::StateCorruption("session has no thread"))
}
