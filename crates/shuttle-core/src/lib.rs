//! shuttle-core
//!
//! Decision core of a workflow orchestration client.
//!
//! Given a task definition (activity or timer) and the ordered history of a
//! workflow execution, compute the next actions for that task. Everything is
//! derived from the history on each call; nothing is persisted.
//!
//! # モジュール構成
//! - **domain**: 履歴（Event, EventList）、アクション、タスク定義、リトライ方針、判定エンジン
//! - **app**: 判定サイクル（複数タスクの判定）と集計

pub mod app;
pub mod domain;

pub use app::{CycleStatus, DecisionCycle};
pub use domain::{
    Action, Decider, Delay, Event, EventList, EventType, RetryStrategy, ShuttleError, Task,
    TaskDecision, TaskDefinition, TaskState,
};
