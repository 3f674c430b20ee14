//! Pure state transition function
//!
//! Given the same phase, context and event this always produces the same
//! result; all I/O is described by the returned effects.

use super::{BridgeContext, Effect, Event, ExchangePhase};
use crate::assistant::{Run, RunStatus};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_phase: ExchangePhase,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(phase: ExchangePhase) -> Self {
        Self {
            new_phase: phase,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Cannot submit an empty message")]
    EmptyUtterance,
    #[error("An exchange is already in progress")]
    ExchangeInProgress,
    #[error("Run {run_id} ended with status {status}: {}", .reason.as_deref().unwrap_or("no error reported"))]
    RunEnded {
        run_id: String,
        status: RunStatus,
        reason: Option<String>,
    },
    #[error("Run {run_id} did not complete after {polls} polls")]
    PollLimitReached { run_id: String, polls: u32 },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

pub fn transition(
    phase: &ExchangePhase,
    context: &BridgeContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (phase, event) {
        // Reset wins from any phase
        (_, Event::Reset) => Ok(TransitionResult::new(ExchangePhase::Idle)
            .with_effect(Effect::ClearSession)
            .with_effect(Effect::RequestRerun)),

        (_, Event::ExchangeAborted) => Ok(TransitionResult::new(ExchangePhase::Idle)),

        (ExchangePhase::Idle, Event::UserInput { text }) => {
            if text.trim().is_empty() {
                return Err(TransitionError::EmptyUtterance);
            }
            Ok(TransitionResult::new(ExchangePhase::Submitted {
                utterance: text.clone(),
                message_id: None,
            })
            .with_effect(Effect::AppendMessage { text }))
        }

        (_, Event::UserInput { .. }) => Err(TransitionError::ExchangeInProgress),

        (
            ExchangePhase::Submitted {
                utterance,
                message_id: None,
            },
            Event::MessageAppended { message_id },
        ) => Ok(TransitionResult::new(ExchangePhase::Submitted {
            utterance: utterance.clone(),
            message_id: Some(message_id),
        })
        .with_effect(Effect::CreateRun {
            assistant_id: context.assistant_id.clone(),
        })),

        (
            ExchangePhase::Submitted {
                message_id: Some(_),
                ..
            },
            Event::RunCreated { run },
        ) => check_run(context, run, 0),

        (ExchangePhase::Polling { run_id, polls }, Event::RunPolled { run }) if *run_id == run.id => {
            check_run(context, run, polls + 1)
        }

        (ExchangePhase::Completed { .. }, Event::HistoryFetched { messages }) => {
            Ok(TransitionResult::new(ExchangePhase::Idle)
                .with_effect(Effect::StoreHistory { messages }))
        }

        (phase, event) => Err(TransitionError::InvalidTransition(format!(
            "{} cannot handle {}",
            phase.name(),
            event.name()
        ))),
    }
}

/// Decide what follows a run observation; `polls` counts refreshes so far
fn check_run(
    context: &BridgeContext,
    run: Run,
    polls: u32,
) -> Result<TransitionResult, TransitionError> {
    if run.is_complete() {
        return Ok(TransitionResult::new(ExchangePhase::Completed { run_id: run.id })
            .with_effect(Effect::FetchHistory));
    }

    if run.status.ended_without_completion() {
        return Err(TransitionError::RunEnded {
            run_id: run.id,
            status: run.status,
            reason: run.last_error,
        });
    }

    if let Some(max_polls) = context.poll.max_polls {
        if polls >= max_polls {
            return Err(TransitionError::PollLimitReached {
                run_id: run.id,
                polls,
            });
        }
    }

    Ok(TransitionResult::new(ExchangePhase::Polling {
        run_id: run.id.clone(),
        polls,
    })
    .with_effect(Effect::PollRun {
        run_id: run.id,
        delay: context.poll.interval,
    }))
}
