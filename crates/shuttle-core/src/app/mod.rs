//! App - アプリケーション層
//!
//! domain の判定エンジンを組み合わせて、1 回の判定サイクルを組み立てます。
//!
//! # 主要コンポーネント
//! - **DecisionCycle**: 複数タスクの判定（名前の一意性を起動時に検証）
//! - **CycleStatus**: 判定結果の集計

pub mod cycle;
pub mod status;

pub use self::cycle::{DecisionCycle, DecisionCycleBuilder};
pub use self::status::CycleStatus;
