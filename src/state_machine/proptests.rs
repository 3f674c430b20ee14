//! Property-based tests for the exchange state machine

use super::transition::TransitionResult;
use super::*;
use crate::assistant::{Message, Run, RunStatus};
use crate::config::PollPolicy;
use chrono::Utc;
use proptest::prelude::*;
use std::time::Duration;

fn test_context(max_polls: Option<u32>) -> BridgeContext {
    BridgeContext::new(
        "asst_123",
        PollPolicy {
            interval: Duration::from_millis(250),
            max_polls,
        },
    )
}

fn pending_run(status: RunStatus) -> Run {
    Run {
        id: "run_1".to_string(),
        assistant_id: "asst_123".to_string(),
        status,
        completed_at: None,
        last_error: None,
    }
}

fn completed_run() -> Run {
    Run {
        status: RunStatus::Completed,
        completed_at: Some(Utc::now()),
        ..pending_run(RunStatus::Completed)
    }
}

/// Apply an event and adopt the new phase
fn step(
    phase: &mut ExchangePhase,
    context: &BridgeContext,
    event: Event,
) -> Result<Vec<Effect>, TransitionError> {
    let TransitionResult { new_phase, effects } = transition(phase, context, event)?;
    *phase = new_phase;
    Ok(effects)
}

/// Drive an exchange up to the run being created
fn start_exchange(phase: &mut ExchangePhase, context: &BridgeContext) {
    step(
        phase,
        context,
        Event::UserInput {
            text: "hello".to_string(),
        },
    )
    .unwrap();
    step(
        phase,
        context,
        Event::MessageAppended {
            message_id: "msg_1".to_string(),
        },
    )
    .unwrap();
}

fn count_polls(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::PollRun { .. }))
        .count()
}

fn arb_pending_status() -> impl Strategy<Value = RunStatus> {
    prop_oneof![
        Just(RunStatus::Queued),
        Just(RunStatus::InProgress),
        Just(RunStatus::RequiresAction),
        Just(RunStatus::Cancelling),
        Just(RunStatus::Unknown),
    ]
}

fn arb_phase() -> impl Strategy<Value = ExchangePhase> {
    prop_oneof![
        Just(ExchangePhase::Idle),
        ("[a-z ]{1,20}", proptest::option::of("msg_[a-z0-9]{4}")).prop_map(
            |(utterance, message_id)| ExchangePhase::Submitted {
                utterance,
                message_id
            }
        ),
        ("run_[a-z0-9]{4}", 0u32..50)
            .prop_map(|(run_id, polls)| ExchangePhase::Polling { run_id, polls }),
        "run_[a-z0-9]{4}".prop_map(|run_id| ExchangePhase::Completed { run_id }),
    ]
}

proptest! {
    /// A run that stays pending for `k` observations is polled exactly `k` times
    #[test]
    fn polls_once_per_pending_observation(
        statuses in proptest::collection::vec(arb_pending_status(), 1..30),
    ) {
        let context = test_context(None);
        let mut phase = ExchangePhase::Idle;
        start_exchange(&mut phase, &context);

        let mut polls = 0;
        let mut observations = statuses.iter().copied();
        let first = observations.next().unwrap();
        polls += count_polls(&step(&mut phase, &context, Event::RunCreated { run: pending_run(first) }).unwrap());
        for status in observations {
            polls += count_polls(&step(&mut phase, &context, Event::RunPolled { run: pending_run(status) }).unwrap());
        }
        let effects = step(&mut phase, &context, Event::RunPolled { run: completed_run() }).unwrap();

        prop_assert_eq!(polls, statuses.len());
        prop_assert_eq!(effects, vec![Effect::FetchHistory]);
        let is_completed = matches!(phase, ExchangePhase::Completed { .. });
        prop_assert!(is_completed);
    }

    /// A run that never completes stops at the poll limit, not before
    #[test]
    fn polling_stops_at_limit(max_polls in 1u32..40) {
        let context = test_context(Some(max_polls));
        let mut phase = ExchangePhase::Idle;
        start_exchange(&mut phase, &context);

        let mut polls = count_polls(
            &step(&mut phase, &context, Event::RunCreated { run: pending_run(RunStatus::InProgress) }).unwrap(),
        );
        let err = loop {
            match step(&mut phase, &context, Event::RunPolled { run: pending_run(RunStatus::InProgress) }) {
                Ok(effects) => polls += count_polls(&effects),
                Err(e) => break e,
            }
        };

        prop_assert_eq!(polls, max_polls as usize);
        prop_assert_eq!(err, TransitionError::PollLimitReached { run_id: "run_1".to_string(), polls: max_polls });
    }

    /// Reset from any phase lands in Idle and clears the session
    #[test]
    fn reset_from_any_phase(phase in arb_phase()) {
        let result = transition(&phase, &test_context(None), Event::Reset).unwrap();
        prop_assert!(result.new_phase.is_idle());
        prop_assert_eq!(result.effects, vec![Effect::ClearSession, Effect::RequestRerun]);
    }

    /// Only an idle session accepts new input
    #[test]
    fn input_only_accepted_when_idle(phase in arb_phase(), text in "[a-zA-Z?]{1,40}") {
        let result = transition(&phase, &test_context(None), Event::UserInput { text: text.clone() });
        if phase.is_idle() {
            let result = result.unwrap();
            prop_assert_eq!(result.effects, vec![Effect::AppendMessage { text }]);
        } else {
            prop_assert_eq!(result.unwrap_err(), TransitionError::ExchangeInProgress);
        }
    }

    /// Fetched history is stored as-is, whatever its length
    #[test]
    fn history_replaces_cache(texts in proptest::collection::vec("[a-z ]{0,30}", 0..10)) {
        let messages: Vec<Message> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Message::assistant(format!("msg_{i}"), t.clone()))
            .collect();
        let phase = ExchangePhase::Completed { run_id: "run_1".to_string() };
        let result = transition(&phase, &test_context(None), Event::HistoryFetched { messages: messages.clone() }).unwrap();
        prop_assert!(result.new_phase.is_idle());
        prop_assert_eq!(result.effects, vec![Effect::StoreHistory { messages }]);
    }
}
