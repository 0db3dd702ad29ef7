use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Position, StoreError, TaskId};

/// 検証済みのタスク本文（前後の空白を除去済み、空ではない）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskText(String);

impl TaskText {
    /// 前後の空白を trim し、空なら InvalidArgument
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StoreError::InvalidArgument(
                "task text must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for TaskText {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TaskText> for String {
    fn from(value: TaskText) -> Self {
        value.0
    }
}

impl fmt::Display for TaskText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 永続化されたタスク（id + text）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
}

impl Task {
    pub fn new(id: TaskId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }

    /// bucket の (key, value) から復元
    pub(crate) fn from_entry(key: &[u8], value: Vec<u8>) -> Result<Self, StoreError> {
        let id = TaskId::from_key(key)?;
        let text = String::from_utf8(value)
            .map_err(|e| StoreError::CorruptRecord(format!("{id} is not valid UTF-8: {e}")))?;
        Ok(Self { id, text })
    }
}

/// Listing row: the task paired with its current 1-based position.
///
/// position は読み出し時に再計算される順位で、id とは別物。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub position: Position,
    pub id: TaskId,
    pub text: String,
}

impl TaskEntry {
    pub fn new(position: Position, task: Task) -> Self {
        Self {
            position,
            id: task.id,
            text: task.text,
        }
    }
}

impl fmt::Display for TaskEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}) {}", self.position, self.text)
    }
}
