//! State - 履歴から再構築したタスクの状態
//!
//! 状態は保存しません。判定のたびに EventList から導出します。

use serde::{Deserialize, Serialize};

/// TaskState は 1 タスク分の再構築結果
///
/// # 状態遷移（activity）
/// - NotStarted -> Scheduled -> Started -> Completed
/// - Started -> Failed -> (retry) -> Scheduled ...
/// - NotStarted -> ScheduleFailed（終端）
///
/// # 状態遷移（timer）
/// - NotStarted -> TimerPending -> TimerFired
/// - NotStarted -> TimerStartFailed（終端）
///
/// # 注意
/// ActivityTaskTimedOut / ActivityTaskCanceled / TimerCanceled は状態を動かしません。
/// タイムアウトやキャンセルされた activity は Started（または Scheduled）のまま残り、
/// 判定は Noop を返し続けます。これらを失敗として扱うかは呼び出し側の責務です。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum TaskState {
    NotStarted,
    Scheduled,
    Started,
    Completed,
    ScheduleFailed { cause: String },
    Failed { failures: usize },
    TimerPending,
    TimerFired,
    TimerStartFailed { cause: String },
}

impl TaskState {
    /// 終端状態か（これ以上進まない）
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed
                | Self::ScheduleFailed { .. }
                | Self::TimerFired
                | Self::TimerStartFailed { .. }
        )
    }

    /// 外部の進捗待ちか
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Started | Self::TimerPending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::completed(TaskState::Completed, true)]
    #[case::schedule_failed(TaskState::ScheduleFailed { cause: "x".into() }, true)]
    #[case::timer_fired(TaskState::TimerFired, true)]
    #[case::timer_start_failed(TaskState::TimerStartFailed { cause: "x".into() }, true)]
    #[case::not_started(TaskState::NotStarted, false)]
    #[case::failed(TaskState::Failed { failures: 1 }, false)]
    #[case::started(TaskState::Started, false)]
    fn terminal_states(#[case] state: TaskState, #[case] terminal: bool) {
        assert_eq!(state.is_terminal(), terminal);
    }

    #[test]
    fn pending_states() {
        assert!(TaskState::Scheduled.is_pending());
        assert!(TaskState::TimerPending.is_pending());
        assert!(!TaskState::Failed { failures: 2 }.is_pending());
    }
}
