//! On-disk layout (format version 1).
//!
//! - `buckets`: namespace ごとの sequence（最後に払い出した値、0 = 未使用）
//! - `entries`: (bucket, key) -> value の順序付き mapping
//!
//! key は BLOB なので byte 比較で並ぶ。TaskId の big-endian key はそのまま昇順になる。

use std::time::Duration;

use rusqlite::Connection;
use tracing::debug;

use crate::domain::StoreError;

pub(crate) const FORMAT_VERSION: i64 = 1;

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS buckets (
    name     TEXT PRIMARY KEY,
    sequence INTEGER NOT NULL DEFAULT 0 CHECK (sequence >= 0)
);
CREATE TABLE IF NOT EXISTS entries (
    bucket TEXT NOT NULL REFERENCES buckets(name) ON DELETE CASCADE,
    key    BLOB NOT NULL,
    value  BLOB NOT NULL,
    PRIMARY KEY (bucket, key)
) WITHOUT ROWID;
";

/// 接続ごとの pragma（crash-safe な rollback journal + FULL sync）
pub(crate) fn configure(conn: &Connection, busy_timeout: Duration) -> Result<(), StoreError> {
    conn.busy_timeout(busy_timeout)?;
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "DELETE", |row| row.get(0))?;
    debug!(journal_mode = %mode, "store pragmas applied");
    conn.pragma_update(None, "synchronous", "FULL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

/// 未知の（新しい）format は開かない。migration はしない。
pub(crate) fn check_format(conn: &Connection) -> Result<i64, StoreError> {
    let found: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if found > FORMAT_VERSION {
        return Err(StoreError::UnsupportedFormat {
            found,
            supported: FORMAT_VERSION,
        });
    }
    Ok(found)
}

/// Must run inside the opening write transaction.
pub(crate) fn install(conn: &Connection, found: i64) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA)?;
    if found < FORMAT_VERSION {
        conn.pragma_update(None, "user_version", FORMAT_VERSION)?;
    }
    Ok(())
}
