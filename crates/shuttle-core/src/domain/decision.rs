//! Decision model: next action determination for a task.
//!
//! This module defines the Decider trait (how to determine the next actions
//! from a history) and TaskDecision (which task asked for what).

use serde::{Deserialize, Serialize};

use super::action::Action;
use super::history::EventList;

/// Trait for deciding the next actions from a workflow history.
///
/// Deciders are pure functions: given the same history they return the same
/// actions, read no clock, and mutate nothing. Replaying a longer history
/// after a restart relies on this.
pub trait Decider {
    /// Decide what to do now.
    ///
    /// # Returns
    /// - empty: nothing to do, the task is at rest (completed or terminal)
    /// - `[Noop]`: the task is pending and needs no new action
    /// - otherwise the actions to submit, in order
    fn decide(&self, history: &EventList) -> Vec<Action>;
}

/// The actions one task asked for in a decision cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDecision {
    pub task: String,
    pub actions: Vec<Action>,
}

impl TaskDecision {
    pub fn new(task: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            task: task.into(),
            actions,
        }
    }

    /// At rest: completed, terminal, or waiting on an unresolved dependency.
    pub fn is_at_rest(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn is_fatal(&self) -> bool {
        self.actions.iter().any(Action::is_fatal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_decision_is_at_rest() {
        let d = TaskDecision::new("a", vec![]);
        assert!(d.is_at_rest());
        assert!(!d.is_fatal());
    }

    #[test]
    fn noop_is_not_at_rest() {
        let d = TaskDecision::new("a", vec![Action::Noop]);
        assert!(!d.is_at_rest());
    }

    #[test]
    fn fatal_decision_is_flagged() {
        let d = TaskDecision::new("a", vec![Action::retry_limit_reached()]);
        assert!(d.is_fatal());
    }
}
