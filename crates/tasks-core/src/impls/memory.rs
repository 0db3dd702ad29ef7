//! InMemoryTaskStore - 永続化しない TaskStore（テスト・開発用）
//!
//! TaskDb と同じ契約（id の単調増加、position の再計算、範囲外は NotFound）を
//! BTreeMap で満たします。

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::iter::Enumerate;

use crate::domain::{Position, StoreError, Task, TaskEntry, TaskId, TaskText};
use crate::observability::StoreStats;
use crate::ports::TaskStore;

#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: BTreeMap<TaskId, String>,
    sequence: u64,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl TaskStore for InMemoryTaskStore {
    type Tasks<'a> = MemoryTasks<'a>;

    fn add_task(&mut self, text: &str) -> Result<Task, StoreError> {
        let text = TaskText::parse(text)?;
        let next = self
            .sequence
            .checked_add(1)
            .ok_or_else(|| StoreError::SequenceExhausted("tasks".to_string()))?;
        self.sequence = next;

        let id = TaskId::new(next);
        self.tasks.insert(id, text.as_str().to_string());
        Ok(Task::new(id, text.into_string()))
    }

    fn list_tasks(&self) -> Result<Self::Tasks<'_>, StoreError> {
        Ok(MemoryTasks {
            inner: self.tasks.iter().enumerate(),
        })
    }

    fn complete_task(&mut self, position: Position) -> Result<Task, StoreError> {
        let Some(id) = self.tasks.keys().nth(position.index()).copied() else {
            return Err(StoreError::NotFound {
                position: position.get(),
                len: self.tasks.len(),
            });
        };
        let text = self
            .tasks
            .remove(&id)
            .ok_or_else(|| StoreError::CorruptRecord(format!("{id} vanished during removal")))?;
        Ok(Task::new(id, text))
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        Ok(StoreStats {
            tasks: self.tasks.len(),
            next_id: self.sequence.saturating_add(1),
        })
    }
}

pub struct MemoryTasks<'a> {
    inner: Enumerate<btree_map::Iter<'a, TaskId, String>>,
}

impl Iterator for MemoryTasks<'_> {
    type Item = Result<TaskEntry, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (index, (id, text)) = self.inner.next()?;
        Some(Ok(TaskEntry::new(
            Position::from_index(index),
            Task::new(*id, text.clone()),
        )))
    }
}
