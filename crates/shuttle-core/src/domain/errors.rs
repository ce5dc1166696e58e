//! Errors - 入力境界のエラー型
//!
//! 判定処理そのもの（`Task::decide`）はエラーを返しません。
//! ここに並ぶのは、履歴やタスク定義を読み込む段階で検出される
//! 「そもそも判定を始められない」入力の不備だけです。

use thiserror::Error;

/// HistoryError は EventList 構築時の不備
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("history must be a JSON array of event records")]
    NotAnArray,

    #[error("event record #{index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("event record #{index} has no eventType")]
    MissingEventType { index: usize },

    #[error("event record #{index} has an unparsable eventTimestamp: {value}")]
    InvalidTimestamp { index: usize, value: String },

    #[error("event record #{index} has a non-object attribute bag `{key}`")]
    InvalidAttributes { index: usize, key: String },
}

/// DefinitionError はタスク定義の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("task name must not be empty")]
    EmptyName,

    #[error("timer task `{name}` has no delay")]
    MissingDelay { name: String },

    #[error("activity task `{name}` cannot take a delay")]
    UnexpectedDelay { name: String },

    #[error("timer task `{name}` cannot take a retry strategy")]
    UnexpectedRetryStrategy { name: String },

    #[error("invalid delay reference `{reference}`, expected `$<activity>.<field>`")]
    InvalidReference { reference: String },
}

/// CycleError は 1 回の判定サイクルを組み立てる際のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error("duplicate task name in decision cycle: {name}")]
    DuplicateTask { name: String },
}

/// ShuttleError は呼び出し側向けにまとめたエラー
#[derive(Debug, Error)]
pub enum ShuttleError {
    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("task definition #{index}: {source}")]
    Task {
        index: usize,
        source: serde_json::Error,
    },
}
