//! Status - 判定サイクルの集計ビュー
//!
//! ログや CLI 出力で「いま何件が動いていて、何件が止まったか」を示す。

use serde::{Deserialize, Serialize};

use crate::domain::{Action, TaskDecision};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStatus {
    /// Schedule / Timer を出したタスク
    pub acting: usize,
    /// Noop（外部の進捗待ち）
    pub pending: usize,
    /// アクションなし（完了・終端・依存待ち）
    pub at_rest: usize,
    /// FatalError を出したタスク
    pub fatal: usize,
}

impl CycleStatus {
    pub fn from_decisions(decisions: &[TaskDecision]) -> Self {
        let mut status = Self::default();
        for decision in decisions {
            if decision.is_fatal() {
                status.fatal += 1;
            } else if decision.is_at_rest() {
                status.at_rest += 1;
            } else if decision.actions.iter().all(|a| *a == Action::Noop) {
                status.pending += 1;
            } else {
                status.acting += 1;
            }
        }
        status
    }

    /// FatalError が 1 件でもあればワークフローは止めるべき
    pub fn should_halt(&self) -> bool {
        self.fatal > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_category() {
        let decisions = vec![
            TaskDecision::new("a", vec![Action::schedule("a", None, None)]),
            TaskDecision::new("b", vec![Action::Noop]),
            TaskDecision::new("c", vec![]),
            TaskDecision::new("d", vec![Action::fatal("boom")]),
            TaskDecision::new("e", vec![Action::timer("e", 1)]),
        ];
        let status = CycleStatus::from_decisions(&decisions);
        assert_eq!(
            status,
            CycleStatus {
                acting: 2,
                pending: 1,
                at_rest: 1,
                fatal: 1
            }
        );
        assert!(status.should_halt());
    }

    #[test]
    fn empty_cycle_does_not_halt() {
        assert!(!CycleStatus::from_decisions(&[]).should_halt());
    }
}
