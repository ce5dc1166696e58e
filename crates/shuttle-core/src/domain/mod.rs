//! Domain model (history, actions, definitions, retry, decision engine).
//!
//! - event / history: 入力の履歴（不変）
//! - definition / retry: 呼び出し側が与えるタスク定義とリトライ方針
//! - action / decision / state: 判定結果と再構築した状態
//! - task: 判定エンジン本体

pub mod action;
pub mod decision;
pub mod definition;
pub mod errors;
pub mod event;
pub mod history;
pub mod retry;
pub mod state;
pub mod task;

pub use action::{Action, RETRY_LIMIT_REACHED, ScheduleOptions};
pub use decision::{Decider, TaskDecision};
pub use definition::{Delay, DelayReference, TaskDefinition, TaskKind};
pub use errors::{CycleError, DefinitionError, HistoryError, ShuttleError};
pub use event::{Event, EventType};
pub use history::EventList;
pub use retry::{BACKOFF_SUFFIX, RetryStrategy, backoff_timer_name};
pub use state::TaskState;
pub use task::{NO_RETRY_STRATEGY, Task};
