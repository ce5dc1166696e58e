//! Retry strategies: turn an activity's failure history into the next action.
//!
//! Strategies hold configuration only. Failure count, last failure and
//! whether the backoff timer fired are re-derived from the history on every
//! call. A started but unfired backoff timer does not count: the timer
//! action is repeated until a `TimerFired` follows the last failure.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::action::Action;
use super::definition::TaskDefinition;
use super::event::{Event, EventType};
use super::history::EventList;

/// Suffix of the implicit timer a backoff strategy waits on.
pub const BACKOFF_SUFFIX: &str = "__backoff";

/// Timer id / control used for `task`'s backoff wait.
pub fn backoff_timer_name(task: &str) -> String {
    format!("{task}{BACKOFF_SUFFIX}")
}

/// Retry policy for failed activities.
///
/// `max_retries` is compared against the number of `ActivityTaskFailed`
/// events seen so far; `0` never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RetryStrategy {
    /// Reschedule right away.
    Immediate { max_retries: u32 },

    /// Wait `backoff_seconds` on a timer before each reschedule.
    ConstantBackoff { backoff_seconds: u64, max_retries: u32 },
}

impl RetryStrategy {
    pub fn max_retries(&self) -> u32 {
        match self {
            Self::Immediate { max_retries } | Self::ConstantBackoff { max_retries, .. } => {
                *max_retries
            }
        }
    }

    /// Decide the next action for a failed activity.
    pub fn compute_action(&self, task: &TaskDefinition, history: &EventList) -> Action {
        let name = task.name();
        let failures = history.count(name, EventType::ActivityTaskFailed);
        let under_limit = failures < self.max_retries() as usize;

        let action = match *self {
            Self::Immediate { .. } => {
                if under_limit {
                    task.schedule_action()
                } else {
                    Action::retry_limit_reached()
                }
            }
            Self::ConstantBackoff {
                backoff_seconds, ..
            } => {
                let timer = backoff_timer_name(name);
                let last_failure = history.latest(name, EventType::ActivityTaskFailed);
                match last_failure.map(|failure| backoff_fired(history, &timer, failure)) {
                    // nothing to back off from
                    None => task.schedule_action(),
                    Some(true) if under_limit => task.schedule_action(),
                    Some(true) => Action::retry_limit_reached(),
                    Some(false) => Action::timer(timer, backoff_seconds),
                }
            }
        };

        debug!(
            task = %name,
            failures,
            max_retries = self.max_retries(),
            action = ?action,
            "retry strategy decided"
        );
        action
    }
}

fn backoff_fired(history: &EventList, timer: &str, last_failure: &Event) -> bool {
    history.any_after(timer, &[EventType::TimerFired], last_failure)
}
