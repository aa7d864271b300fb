use std::time::Duration;

use async_trait::async_trait;

use crate::options::PollOptions;
use crate::service::QnaService;
use crate::types::{Operation, OperationState};

/// Source of delay between polls, so tests need not wait in real time
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

/// How waiting on an operation ended
#[derive(Debug)]
pub enum PollOutcome {
    /// The operation reached a terminal state (successful or not)
    Finished(Operation),

    /// The status request itself was refused
    Rejected(reqwest::StatusCode),

    /// Still not terminal after the allowed number of polls
    TimedOut { attempts: usize, last: OperationState },
}

/// Poll `operation_id` until it leaves the NotStarted/Running states
pub async fn wait_for_operation<S: QnaService + ?Sized>(
    service: &S,
    operation_id: &str,
    options: &PollOptions,
    sleeper: &dyn Sleeper,
) -> anyhow::Result<PollOutcome> {
    let mut state = OperationState::NotStarted;
    let max_attempts = options.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let reply = service.get_operation_details(operation_id).await?;
        let Some(operation) = reply.body.filter(|_| reply.status.is_success()) else {
            return Ok(PollOutcome::Rejected(reply.status));
        };

        tracing::info!(attempt, "Operation state - {}", operation.operation_state);
        if operation.operation_state.is_terminal() {
            return Ok(PollOutcome::Finished(operation));
        }
        state = operation.operation_state;
        sleeper.sleep(options.interval).await;
    }

    Ok(PollOutcome::TimedOut {
        attempts: max_attempts,
        last: state,
    })
}
