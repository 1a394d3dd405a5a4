//! Deferred action polling.
//!
//! Mutating calls may answer with an action ID instead of a result. The poller
//! queries `GET /open-api/v1/result/{actionId}` until the action reaches a
//! terminal state:
//!
//! | poll answer              | state       | next                                   |
//! |--------------------------|-------------|----------------------------------------|
//! | 200 + parsable body      | `Succeeded` | return the envelope                    |
//! | 200 + malformed body     | `Failed`    | return the decode error                |
//! | 202                      | `Running`   | sleep and poll again, or give up at 0  |
//! | any other status         | `Failed`    | return the http error, no retry        |
//! | transport error          | `Failed`    | return the wrapped transport error     |

use std::future::Future;

use crate::{EdgeError, Envelope, Result, RetryBudget};

pub(crate) const RESULT_RESOURCE: &str = "/open-api/v1/result";

/// State of a deferred action after one poll.
#[derive(Debug)]
pub(crate) enum PollState {
    /// Still running; carries the "job still running" signal.
    Running(EdgeError),
    Succeeded(Envelope),
    Failed(EdgeError),
}

impl PollState {
    /// Classifies one answer of the result endpoint.
    pub(crate) fn from_response(status: u16, body: &[u8], context: &str) -> Self {
        match status {
            200 => match Envelope::parse(body) {
                Ok(envelope) => Self::Succeeded(envelope),
                Err(err) => Self::Failed(err),
            },
            202 => Self::Running(EdgeError::JobRunning { status }),
            _ => Self::Failed(EdgeError::http(
                context,
                status,
                String::from_utf8_lossy(body).into_owned(),
            )),
        }
    }
}

/// Decision taken after a poll.
#[derive(Debug)]
pub(crate) enum Step {
    Done(Envelope),
    Fail(EdgeError),
    /// Sleep, spend one attempt, poll again.
    Retry(EdgeError),
    /// Still running with no attempts left.
    Exhausted(EdgeError),
}

pub(crate) fn next_step(state: PollState, remaining: u32) -> Step {
    match state {
        PollState::Succeeded(envelope) => Step::Done(envelope),
        PollState::Failed(err) => Step::Fail(err),
        PollState::Running(err) if remaining == 0 => Step::Exhausted(err),
        PollState::Running(err) => Step::Retry(err),
    }
}

/// Drives `poll` until the action terminates or `budget` runs out.
///
/// Polls are strictly sequential; at most `budget.attempts + 1` polls are made.
pub(crate) async fn poll_until_done<F, Fut>(
    action_id: &str,
    budget: RetryBudget,
    mut poll: F,
) -> Result<Envelope>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PollState>,
{
    let mut remaining = budget.attempts;
    let mut polls = 0u32;
    loop {
        let state = poll().await;
        polls += 1;
        match next_step(state, remaining) {
            Step::Done(envelope) => return Ok(envelope),
            Step::Fail(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(action_id, polls, error = %err, "action failed");
                return Err(err);
            }
            Step::Exhausted(last) => {
                return Err(EdgeError::PollExhausted {
                    action_id: action_id.to_owned(),
                    polls,
                    last: Box::new(last),
                });
            }
            Step::Retry(_last) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    action_id,
                    remaining,
                    latest = %_last,
                    "waiting for action to complete"
                );
                tokio::time::sleep(budget.interval).await;
                remaining = remaining.saturating_sub(1);
            }
        }
    }
}
