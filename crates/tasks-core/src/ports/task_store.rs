//! TaskStore port - タスク永続化の抽象化
//!
//! CLI はこの trait 越しに store を操作します。
//! - 本番: [`crate::store::TaskDb`]（SQLite file + 排他 lock）
//! - テスト: [`crate::impls::InMemoryTaskStore`]

use crate::domain::{Position, StoreError, Task, TaskEntry};
use crate::observability::StoreStats;

/// TaskStore はタスクの追加・一覧・完了を提供する
///
/// # 保証
/// - `add_task` / `complete_task` は 1 transaction で all-or-nothing
/// - `list_tasks` は id 昇順、position は 1 始まりで読み出し時に再計算
/// - 失敗時はリトライせず、そのまま呼び出し元に返す
pub trait TaskStore {
    /// Lazy listing cursor.
    type Tasks<'a>: Iterator<Item = Result<TaskEntry, StoreError>> + 'a
    where
        Self: 'a;

    /// text を trim して保存し、払い出した id とともに返す
    fn add_task(&mut self, text: &str) -> Result<Task, StoreError>;

    /// 現在のタスクを id 昇順で列挙する（呼び直せば先頭からやり直し）
    fn list_tasks(&self) -> Result<Self::Tasks<'_>, StoreError>;

    /// position 番目のタスクを削除し、削除したタスクを返す
    ///
    /// 範囲外なら `StoreError::NotFound`（store は変更しない）
    fn complete_task(&mut self, position: Position) -> Result<Task, StoreError>;

    /// 現在のタスク数と次に払い出す id
    fn stats(&self) -> Result<StoreStats, StoreError>;
}
