//! Action model: what the decider asks the surrounding system to do next.
//!
//! An empty action list means "at rest" (done, or waiting on something the
//! task cannot influence). [`Action::Noop`] means "still pending" and is
//! emitted explicitly so callers can tell the two apart.

use serde::{Deserialize, Serialize};

/// Fixed reason for retry exhaustion.
pub const RETRY_LIMIT_REACHED: &str = "Retry limit reached.";

/// Options forwarded with a schedule request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOptions {
    pub version: Option<String>,
}

/// The next action to take for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    /// Start (or restart) the activity.
    Schedule {
        name: String,
        input: Option<serde_json::Value>,
        options: ScheduleOptions,
    },

    /// Start a named timer.
    Timer { name: String, delay_seconds: u64 },

    /// Give up on the task. Terminal.
    FatalError {
        reason: String,
        details: Option<serde_json::Value>,
    },

    /// Task is pending; nothing new to do.
    Noop,
}

impl Action {
    pub fn schedule(
        name: impl Into<String>,
        input: Option<serde_json::Value>,
        version: Option<String>,
    ) -> Self {
        Self::Schedule {
            name: name.into(),
            input,
            options: ScheduleOptions { version },
        }
    }

    pub fn timer(name: impl Into<String>, delay_seconds: u64) -> Self {
        Self::Timer {
            name: name.into(),
            delay_seconds,
        }
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        Self::FatalError {
            reason: reason.into(),
            details: None,
        }
    }

    pub fn fatal_with_details(reason: impl Into<String>, details: serde_json::Value) -> Self {
        Self::FatalError {
            reason: reason.into(),
            details: Some(details),
        }
    }

    pub fn retry_limit_reached() -> Self {
        Self::fatal(RETRY_LIMIT_REACHED)
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FatalError { .. })
    }
}
