//! DecisionCycle - 1 回の判定サイクルで複数タスクを判定
//!
//! # 学習ポイント
//! - Builder パターン（AppBuilder と同じ形）
//! - 起動時検証（タスク名の重複は build() で弾く）
//! - 各タスクは自分の名前に紐づくイベントだけを読むので、順序に依存しない

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::{
    Action, CycleError, Decider, EventList, ShuttleError, Task, TaskDecision, TaskDefinition,
};

use super::status::CycleStatus;

/// DecisionCycleBuilder はタスク定義を集めて検証する
///
/// # 使用例
/// ```ignore
/// let cycle = DecisionCycle::builder()
///     .task(TaskDefinition::activity("createOffer"))
///     .task(TaskDefinition::timer("wait", Delay::Seconds(10)))
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct DecisionCycleBuilder {
    definitions: Vec<TaskDefinition>,
}

impl DecisionCycleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(mut self, definition: TaskDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn tasks(mut self, definitions: impl IntoIterator<Item = TaskDefinition>) -> Self {
        self.definitions.extend(definitions);
        self
    }

    /// # 検証
    /// - タスク名が一意であること（イベントとの対応付けが名前だけで行われるため）
    pub fn build(self) -> Result<DecisionCycle, CycleError> {
        let mut seen = HashSet::new();
        for definition in &self.definitions {
            if !seen.insert(definition.name()) {
                return Err(CycleError::DuplicateTask {
                    name: definition.name().to_string(),
                });
            }
        }

        Ok(DecisionCycle {
            tasks: self.definitions.into_iter().map(Task::new).collect(),
        })
    }
}

/// DecisionCycle は定義順にタスクを判定する
#[derive(Debug, Clone)]
pub struct DecisionCycle {
    tasks: Vec<Task>,
}

impl DecisionCycle {
    pub fn builder() -> DecisionCycleBuilder {
        DecisionCycleBuilder::new()
    }

    pub fn new(definitions: Vec<TaskDefinition>) -> Result<Self, CycleError> {
        Self::builder().tasks(definitions).build()
    }

    /// JSON のタスク定義から組み立てる（単体の定義でも配列でも可）
    pub fn from_json(definitions: &Value) -> Result<Self, ShuttleError> {
        let items = match definitions {
            Value::Array(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        let definitions = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                TaskDefinition::deserialize(item)
                    .map_err(|source| ShuttleError::Task { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(definitions)?)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// 全タスクを判定（定義順）
    pub fn decide(&self, history: &EventList) -> Vec<TaskDecision> {
        let decisions: Vec<TaskDecision> = self
            .tasks
            .iter()
            .map(|task| TaskDecision::new(task.name(), task.decide(history)))
            .collect();
        debug!(
            tasks = decisions.len(),
            events = history.len(),
            "decision cycle finished"
        );
        decisions
    }

    /// 判定結果をひとつのアクション列に平坦化
    pub fn actions(&self, history: &EventList) -> Vec<Action> {
        self.decide(history)
            .into_iter()
            .flat_map(|decision| decision.actions)
            .collect()
    }

    pub fn status(&self, history: &EventList) -> CycleStatus {
        CycleStatus::from_decisions(&self.decide(history))
    }

    /// 生の履歴レコード（JSON 配列）を読み込んで判定
    pub fn decide_json(&self, history: &Value) -> Result<Vec<TaskDecision>, ShuttleError> {
        let history = EventList::from_json(history)?;
        Ok(self.decide(&history))
    }
}
