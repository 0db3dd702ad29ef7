//! Transaction wrapper.
//!
//! - `run_update`: IMMEDIATE transaction。closure が Ok なら commit、Err なら rollback
//! - `run_view`: 読み取り専用。最後に必ず rollback する
//!
//! closure 内のエラーは `TransactionAborted` に包んで返す。
//! rollback 後の store は呼び出し前と完全に同じ状態。

use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, warn};

use super::bucket::Bucket;
use crate::domain::StoreError;

/// A live transaction handed to `update` / `view` closures.
pub struct Tx<'conn> {
    conn: &'conn Connection,
    writable: bool,
}

impl<'conn> Tx<'conn> {
    /// 既存の bucket を開く（無ければ BucketNotFound）
    pub fn bucket(&self, name: &str) -> Result<Bucket<'conn>, StoreError> {
        let exists: bool = self
            .conn
            .prepare_cached("SELECT EXISTS(SELECT 1 FROM buckets WHERE name = ?1)")?
            .query_row([name], |row| row.get(0))?;
        if !exists {
            return Err(StoreError::BucketNotFound(name.to_string()));
        }
        Ok(Bucket::new(self.conn, name, self.writable))
    }

    pub fn create_bucket_if_not_exists(&self, name: &str) -> Result<Bucket<'conn>, StoreError> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        if name.is_empty() {
            return Err(StoreError::InvalidArgument(
                "bucket name must not be empty".to_string(),
            ));
        }
        let created = self
            .conn
            .prepare_cached("INSERT OR IGNORE INTO buckets(name, sequence) VALUES (?1, 0)")?
            .execute([name])?;
        if created > 0 {
            debug!(bucket = name, "bucket created");
        }
        Ok(Bucket::new(self.conn, name, true))
    }

    pub(crate) fn conn(&self) -> &'conn Connection {
        self.conn
    }
}

pub(crate) fn run_update<T>(
    conn: &mut Connection,
    op: &'static str,
    f: impl FnOnce(&Tx<'_>) -> Result<T, StoreError>,
) -> Result<T, StoreError> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|err| StoreError::aborted(op, err.into()))?;
    debug!(op, "write transaction started");

    let result = f(&Tx {
        conn: &*tx,
        writable: true,
    });

    match result {
        Ok(value) => {
            tx.commit()
                .map_err(|err| StoreError::aborted(op, err.into()))?;
            debug!(op, "write transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(op, error = %rollback_err, "rollback failed");
            }
            warn!(op, error = %err, "write transaction rolled back");
            Err(StoreError::aborted(op, err))
        }
    }
}

pub(crate) fn run_view<T>(
    conn: &Connection,
    f: impl FnOnce(&Tx<'_>) -> Result<T, StoreError>,
) -> Result<T, StoreError> {
    let tx = conn.unchecked_transaction()?;
    let result = f(&Tx {
        conn: &*tx,
        writable: false,
    });
    tx.rollback()?;
    result
}
