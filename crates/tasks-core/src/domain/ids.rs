//! Domain identifiers.
//!
//! # TaskId
//! TaskId は store の sequence から払い出される永続的な識別子です。
//! - 一度払い出した値は削除後も再利用しない
//! - 払い出し順に単調増加する
//!
//! ## On-disk key
//! bucket の key は 8 byte の big-endian 表現です。
//! big-endian にしておくと byte 比較の順序と数値順序が一致するため、
//! cursor で走査するだけで昇順（= 挿入順）になります。

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::StoreError;

/// Width of an encoded [`TaskId`] key in bytes.
pub const KEY_LEN: usize = 8;

/// Identifier of a Task (permanent, never reused).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// bucket に書き込む key（big-endian 8 byte）
    pub fn to_key(self) -> [u8; KEY_LEN] {
        self.0.to_be_bytes()
    }

    /// bucket から読んだ key を復元
    ///
    /// 長さが 8 byte でなければ壊れたレコードとして扱う。
    pub fn from_key(key: &[u8]) -> Result<Self, StoreError> {
        let bytes: [u8; KEY_LEN] = key.try_into().map_err(|_| {
            StoreError::CorruptRecord(format!(
                "task key must be {KEY_LEN} bytes, got {}",
                key.len()
            ))
        })?;
        Ok(Self(u64::from_be_bytes(bytes)))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}
