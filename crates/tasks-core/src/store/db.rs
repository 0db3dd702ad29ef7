//! TaskDb - SQLite file に永続化する TaskStore
//!
//! # ライフサイクル
//! 1. `open`: 排他 lock（最大 lock_timeout 待つ）→ file を開く（無ければ作る）
//!    → schema と "tasks" bucket を 1 transaction で用意
//! 2. 各操作は 1 transaction（add / complete）
//! 3. `close`（または drop）で flush して lock を解放
//!
//! コマンド 1 回ごとに open / close する前提で、常駐プロセスは想定しない。

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{debug, info, warn};

use super::bucket::Entries;
use super::lock::FileLock;
use super::schema;
use super::tx::{Tx, run_update, run_view};
use crate::config::StoreConfig;
use crate::domain::{Position, StoreError, StoreState, Task, TaskEntry, TaskId, TaskText};
use crate::observability::StoreStats;
use crate::ports::TaskStore;

/// Namespace holding the task records.
pub const TASKS_BUCKET: &str = "tasks";

/// Open handle on the task database file.
#[derive(Debug)]
pub struct TaskDb {
    path: PathBuf,
    conn: Option<Connection>,
    lock: Option<FileLock>,
}

enum Completion {
    Removed(Task),
    OutOfRange { len: usize },
}

impl TaskDb {
    /// Opens (creating if absent) the store described by `config`.
    ///
    /// 失敗した場合は何も保持しない（lock も解放される）。
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let path = config.path.clone();
        let timeout = config.lock_timeout();
        debug!(path = %path.display(), ?timeout, "opening task store");

        let lock = FileLock::acquire(&path, timeout)?;
        debug!(lock = %lock.path().display(), "holding store lock");
        let mut conn = Connection::open(&path)?;
        schema::configure(&conn, timeout)?;
        let found = schema::check_format(&conn)?;
        run_update(&mut conn, "open", |tx| {
            schema::install(tx.conn(), found)?;
            tx.create_bucket_if_not_exists(TASKS_BUCKET)?;
            Ok(())
        })?;

        debug!(path = %path.display(), "task store opened");
        Ok(Self {
            path,
            conn: Some(conn),
            lock: Some(lock),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> StoreState {
        if self.conn.is_some() {
            StoreState::Open
        } else {
            StoreState::Closed
        }
    }

    /// Flushes and releases the lock. The handle is Closed afterwards even on error.
    pub fn close(&mut self) -> Result<(), StoreError> {
        let conn = self.conn.take();
        let lock = self.lock.take();

        let result = match conn {
            Some(conn) => conn.close().map_err(|(_, err)| StoreError::from(err)),
            None => Ok(()),
        };
        if lock.is_some() {
            drop(lock);
            debug!(path = %self.path.display(), "task store closed");
        }
        result
    }

    /// 書き込み transaction。closure が Err を返すと全体を rollback する。
    pub fn update<T>(
        &mut self,
        f: impl FnOnce(&Tx<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        run_update(self.conn_mut()?, "update", f)
    }

    /// 読み取り transaction
    pub fn view<T>(&self, f: impl FnOnce(&Tx<'_>) -> Result<T, StoreError>) -> Result<T, StoreError> {
        run_view(self.conn()?, f)
    }

    fn conn(&self) -> Result<&Connection, StoreError> {
        self.conn.as_ref().ok_or(StoreError::Closed)
    }

    fn conn_mut(&mut self) -> Result<&mut Connection, StoreError> {
        self.conn.as_mut().ok_or(StoreError::Closed)
    }
}

impl TaskStore for TaskDb {
    type Tasks<'a> = TaskCursor<'a>;

    fn add_task(&mut self, text: &str) -> Result<Task, StoreError> {
        let conn = self.conn_mut()?;
        let text = TaskText::parse(text)?;

        let task = run_update(conn, "add_task", |tx| {
            let bucket = tx.bucket(TASKS_BUCKET)?;
            let id = TaskId::new(bucket.next_sequence()?);
            bucket.put(&id.to_key(), text.as_str().as_bytes())?;
            Ok(Task::new(id, text.as_str()))
        })?;

        info!(id = %task.id, "task added");
        Ok(task)
    }

    fn list_tasks(&self) -> Result<Self::Tasks<'_>, StoreError> {
        Ok(TaskCursor::new(Entries::new(self.conn()?, TASKS_BUCKET)))
    }

    fn complete_task(&mut self, position: Position) -> Result<Task, StoreError> {
        let conn = self.conn_mut()?;

        let completion = run_update(conn, "complete_task", |tx| {
            let bucket = tx.bucket(TASKS_BUCKET)?;
            let Some(entry) = bucket.iter().nth(position.index()) else {
                return Ok(Completion::OutOfRange { len: bucket.len()? });
            };
            let (key, value) = entry?;
            let task = Task::from_entry(&key, value)?;
            bucket.delete(&key)?;
            Ok(Completion::Removed(task))
        })?;

        match completion {
            Completion::Removed(task) => {
                info!(id = %task.id, %position, "task completed");
                Ok(task)
            }
            Completion::OutOfRange { len } => Err(StoreError::NotFound {
                position: position.get(),
                len,
            }),
        }
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        self.view(|tx| {
            let bucket = tx.bucket(TASKS_BUCKET)?;
            Ok(StoreStats {
                tasks: bucket.len()?,
                next_id: bucket.sequence()?.saturating_add(1),
            })
        })
    }
}

impl Drop for TaskDb {
    fn drop(&mut self) {
        if self.state().is_open()
            && let Err(err) = self.close()
        {
            warn!(path = %self.path.display(), error = %err, "failed to close task store");
        }
    }
}

/// Lazy listing over the tasks bucket, numbering entries from position 1.
///
/// 各 page は autocommit で読むが、`&TaskDb` を借りている間は
/// 同じ handle から書き込めず、他プロセスは lock で締め出されている。
pub struct TaskCursor<'a> {
    entries: Entries<'a>,
    index: usize,
}

impl<'a> TaskCursor<'a> {
    fn new(entries: Entries<'a>) -> Self {
        Self { entries, index: 0 }
    }
}

impl Iterator for TaskCursor<'_> {
    type Item = Result<TaskEntry, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = match self.entries.next()? {
            Ok(kv) => kv,
            Err(err) => return Some(Err(err)),
        };
        let position = Position::from_index(self.index);
        self.index += 1;
        Some(Task::from_entry(&key, value).map(|task| TaskEntry::new(position, task)))
    }
}
