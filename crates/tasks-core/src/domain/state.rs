//! State - store handle の状態
//!
//! # 状態遷移
//! - Closed -> Open: `TaskDb::open` の成功時のみ（失敗時は Closed のまま）
//! - Open -> Closed: `TaskDb::close`（無条件）
//!
//! Open 以外での操作はすべて `StoreError::Closed` で即座に失敗します。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreState {
    /// file lock を保持し、transaction を実行できる
    Open,

    /// file を保持していない
    Closed,
}

impl StoreState {
    pub fn is_open(self) -> bool {
        matches!(self, StoreState::Open)
    }
}
