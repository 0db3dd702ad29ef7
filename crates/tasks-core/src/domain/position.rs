//! Position - 一覧上の 1 始まりの順位
//!
//! Position は保存された TaskId ではなく、現在存在するタスクの中での順位です。
//! 削除が起きると後続のタスクの position は 1 つずつ詰まります。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use super::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(NonZeroUsize);

impl Position {
    /// 0 は None
    pub fn new(value: usize) -> Option<Self> {
        NonZeroUsize::new(value).map(Self)
    }

    pub fn first() -> Self {
        Self(NonZeroUsize::MIN)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }

    /// 0 始まりの index
    pub fn index(self) -> usize {
        self.0.get() - 1
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(NonZeroUsize::MIN.saturating_add(index))
    }
}

impl FromStr for Position {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: i64 = trimmed.parse().map_err(|_| {
            StoreError::InvalidArgument(format!("position must be an integer, got {s:?}"))
        })?;
        usize::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| {
                StoreError::InvalidArgument(format!("position must be positive, got {value}"))
            })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
