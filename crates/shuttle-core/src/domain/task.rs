//! Task: the decision engine for a single activity or timer.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::action::Action;
use super::decision::Decider;
use super::definition::{Delay, DelayReference, TaskDefinition, TaskKind};
use super::event::EventType;
use super::history::EventList;
use super::state::TaskState;

/// Reason given when an activity fails and nothing is configured to retry it.
pub const NO_RETRY_STRATEGY: &str = "Activity failed and no retry strategy is configured.";

/// Activity events that move an activity between states. Completion is
/// checked separately because it absorbs everything else. Timeouts and
/// cancellations are absent, so they leave the activity pending (see `TaskState`).
const ACTIVITY_PROGRESS: &[EventType] = &[
    EventType::ScheduleActivityTaskFailed,
    EventType::ActivityTaskScheduled,
    EventType::ActivityTaskStarted,
    EventType::ActivityTaskFailed,
];

/// Outcome of resolving a timer's delay against the history.
#[derive(Debug, Clone, PartialEq)]
enum ResolvedDelay {
    Seconds(u64),
    /// Upstream activity has not completed yet.
    Unavailable,
    /// Upstream completed, but its result does not yield a delay.
    Unresolvable(Value),
}

/// A task definition bound to the decision logic.
///
/// `decide` is a pure function of the definition and the supplied history.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    definition: TaskDefinition,
}

impl Task {
    pub fn new(definition: TaskDefinition) -> Self {
        Self { definition }
    }

    pub fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Reconstruct this task's state from the history.
    pub fn state(&self, history: &EventList) -> TaskState {
        match self.definition.kind() {
            TaskKind::Activity { .. } => self.activity_state(history),
            TaskKind::Timer { .. } => self.timer_state(history),
        }
    }

    fn activity_state(&self, history: &EventList) -> TaskState {
        let name = self.name();
        if history.has_event(name, EventType::ActivityTaskCompleted) {
            return TaskState::Completed;
        }

        let Some(latest) = history.latest_of(name, ACTIVITY_PROGRESS) else {
            return TaskState::NotStarted;
        };

        match latest.event_type() {
            EventType::ScheduleActivityTaskFailed => TaskState::ScheduleFailed {
                cause: latest
                    .cause()
                    .unwrap_or("ScheduleActivityTaskFailed")
                    .to_string(),
            },
            EventType::ActivityTaskScheduled => TaskState::Scheduled,
            EventType::ActivityTaskStarted => TaskState::Started,
            _ => TaskState::Failed {
                failures: history.count(name, EventType::ActivityTaskFailed),
            },
        }
    }

    fn timer_state(&self, history: &EventList) -> TaskState {
        let name = self.name();
        let started = history.latest(name, EventType::TimerStarted);
        let start_failed = history.latest(name, EventType::StartTimerFailed);

        match (started, start_failed) {
            (started, Some(failed))
                if started.is_none_or(|s| EventList::occurs_after(failed, s)) =>
            {
                TaskState::TimerStartFailed {
                    cause: failed
                        .cause()
                        .unwrap_or("StartTimerFailed")
                        .to_string(),
                }
            }
            (Some(_), _) if history.has_event(name, EventType::TimerFired) => {
                TaskState::TimerFired
            }
            (Some(_), _) => TaskState::TimerPending,
            (None, _) => TaskState::NotStarted,
        }
    }

    fn resolve_delay(&self, delay: &Delay, history: &EventList) -> ResolvedDelay {
        match delay {
            Delay::Seconds(seconds) => ResolvedDelay::Seconds(*seconds),
            Delay::Reference(reference) => resolve_reference(reference, history),
        }
    }

    fn decide_activity(&self, state: &TaskState, history: &EventList) -> Vec<Action> {
        match state {
            TaskState::NotStarted => vec![self.definition.schedule_action()],
            TaskState::ScheduleFailed { cause } => {
                warn!(task = %self.name(), cause = %cause, "activity could not be scheduled");
                vec![Action::fatal(cause.clone())]
            }
            TaskState::Scheduled | TaskState::Started => vec![Action::Noop],
            TaskState::Failed { .. } => match self.definition.retry_strategy() {
                Some(strategy) => {
                    let action = strategy.compute_action(&self.definition, history);
                    if action.is_fatal() {
                        warn!(task = %self.name(), "retry limit reached");
                    }
                    vec![action]
                }
                None => {
                    warn!(task = %self.name(), "activity failed without a retry strategy");
                    vec![self.no_retry_fatal(history)]
                }
            },
            _ => Vec::new(),
        }
    }

    fn decide_timer(&self, delay: &Delay, state: &TaskState, history: &EventList) -> Vec<Action> {
        match state {
            TaskState::NotStarted => match self.resolve_delay(delay, history) {
                ResolvedDelay::Seconds(seconds) => vec![Action::timer(self.name(), seconds)],
                ResolvedDelay::Unavailable => {
                    debug!(task = %self.name(), "delay reference not yet available");
                    Vec::new()
                }
                ResolvedDelay::Unresolvable(details) => {
                    warn!(task = %self.name(), details = %details, "delay reference unresolvable");
                    let reason = match delay {
                        Delay::Reference(reference) => {
                            format!("Unable to resolve delay reference {reference}.")
                        }
                        Delay::Seconds(_) => "Unable to resolve delay.".to_string(),
                    };
                    vec![Action::fatal_with_details(reason, details)]
                }
            },
            TaskState::TimerPending => vec![Action::Noop],
            TaskState::TimerStartFailed { cause } => {
                warn!(task = %self.name(), cause = %cause, "timer could not be started");
                vec![Action::fatal(cause.clone())]
            }
            _ => Vec::new(),
        }
    }

    fn no_retry_fatal(&self, history: &EventList) -> Action {
        let mut details = Map::new();
        if let Some(failure) = history.latest(self.name(), EventType::ActivityTaskFailed) {
            if let Some(reason) = failure.reason() {
                details.insert("reason".to_string(), Value::from(reason));
            }
            if let Some(detail) = failure.details() {
                details.insert("details".to_string(), Value::from(detail));
            }
        }

        if details.is_empty() {
            Action::fatal(NO_RETRY_STRATEGY)
        } else {
            Action::fatal_with_details(NO_RETRY_STRATEGY, Value::Object(details))
        }
    }
}

impl Decider for Task {
    fn decide(&self, history: &EventList) -> Vec<Action> {
        let state = self.state(history);
        let actions = match self.definition.kind() {
            TaskKind::Activity { .. } => self.decide_activity(&state, history),
            TaskKind::Timer { delay } => self.decide_timer(delay, &state, history),
        };
        debug!(task = %self.name(), state = ?state, actions = ?actions, "decided");
        actions
    }
}

fn resolve_reference(reference: &DelayReference, history: &EventList) -> ResolvedDelay {
    let Some(completed) = history.latest(reference.activity(), EventType::ActivityTaskCompleted)
    else {
        return ResolvedDelay::Unavailable;
    };

    let unresolvable = |problem: &str| {
        ResolvedDelay::Unresolvable(serde_json::json!({
            "reference": reference.to_string(),
            "problem": problem,
        }))
    };

    match completed.result() {
        None => unresolvable("referenced activity completed without a result"),
        Some(Err(_)) => unresolvable("referenced result is not valid JSON"),
        Some(Ok(result)) => match reference.extract(&result) {
            Some(seconds) => ResolvedDelay::Seconds(seconds),
            None => unresolvable("referenced field is missing or not a non-negative integer"),
        },
    }
}
