//! Bucket - 名前付き namespace の順序付き key/value mapping
//!
//! # 学習ポイント
//! - key は byte 列の辞書順で並ぶ
//! - `next_sequence` は同じ transaction 内で counter を更新する
//!   （record の書き込みと一緒に commit / rollback される）
//! - `iter` は keyset pagination による lazy cursor

use std::collections::VecDeque;

use rusqlite::{Connection, OptionalExtension, params};

use crate::domain::StoreError;

const PAGE_SIZE: usize = 64;

pub struct Bucket<'conn> {
    conn: &'conn Connection,
    name: String,
    writable: bool,
}

impl<'conn> Bucket<'conn> {
    pub(crate) fn new(conn: &'conn Connection, name: &str, writable: bool) -> Self {
        Self {
            conn,
            name: name.to_string(),
            writable,
        }
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let value = self
            .conn
            .prepare_cached("SELECT value FROM entries WHERE bucket = ?1 AND key = ?2")?
            .query_row(params![self.name, key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    /// key が既にあれば上書き
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.ensure_writable()?;
        if key.is_empty() {
            return Err(StoreError::InvalidArgument("key must not be empty".to_string()));
        }
        self.conn
            .prepare_cached(
                "INSERT INTO entries(bucket, key, value) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(bucket, key) DO UPDATE SET value = excluded.value",
            )?
            .execute(params![self.name, key, value])?;
        Ok(())
    }

    /// 削除したら true
    pub fn delete(&self, key: &[u8]) -> Result<bool, StoreError> {
        self.ensure_writable()?;
        let removed = self
            .conn
            .prepare_cached("DELETE FROM entries WHERE bucket = ?1 AND key = ?2")?
            .execute(params![self.name, key])?;
        Ok(removed > 0)
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .prepare_cached("SELECT COUNT(*) FROM entries WHERE bucket = ?1")?
            .query_row([&self.name], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| StoreError::CorruptRecord(format!("negative entry count {count}")))
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Last value handed out by `next_sequence` (0 on a fresh bucket, at most `i64::MAX`).
    pub fn sequence(&self) -> Result<u64, StoreError> {
        let raw: i64 = self
            .conn
            .prepare_cached("SELECT sequence FROM buckets WHERE name = ?1")?
            .query_row([&self.name], |row| row.get(0))
            .optional()?
            .ok_or_else(|| StoreError::BucketNotFound(self.name.clone()))?;
        u64::try_from(raw)
            .map_err(|_| StoreError::CorruptRecord(format!("negative sequence {raw}")))
    }

    /// counter を 1 進めて永続化し、新しい値を返す（新規 bucket では 1）
    ///
    /// SQLite の INTEGER は符号付きなので上限は `i64::MAX`。
    /// それを超える場合は `SequenceExhausted`（counter は変更しない）。
    pub fn next_sequence(&self) -> Result<u64, StoreError> {
        self.ensure_writable()?;
        let next = self
            .sequence()?
            .checked_add(1)
            .filter(|next| i64::try_from(*next).is_ok())
            .ok_or_else(|| StoreError::SequenceExhausted(self.name.clone()))?;
        self.conn
            .prepare_cached("UPDATE buckets SET sequence = ?2 WHERE name = ?1")?
            .execute(params![self.name, next as i64])?;
        Ok(next)
    }

    /// key 昇順の lazy cursor
    pub fn iter(&self) -> Entries<'conn> {
        Entries::new(self.conn, &self.name)
    }

    fn ensure_writable(&self) -> Result<(), StoreError> {
        if self.writable {
            Ok(())
        } else {
            Err(StoreError::ReadOnly)
        }
    }
}

/// Ascending `(key, value)` cursor over one bucket.
///
/// 一度に `PAGE_SIZE` 件ずつ読み、最後に返した key より後ろから続きを読む。
/// 途中でエラーが出たらそれを返して終了する。
pub struct Entries<'conn> {
    conn: &'conn Connection,
    bucket: String,
    after: Vec<u8>,
    page: VecDeque<(Vec<u8>, Vec<u8>)>,
    exhausted: bool,
}

impl<'conn> Entries<'conn> {
    pub(crate) fn new(conn: &'conn Connection, bucket: &str) -> Self {
        Self {
            conn,
            bucket: bucket.to_string(),
            after: Vec::new(),
            page: VecDeque::new(),
            exhausted: false,
        }
    }

    fn fetch_page(&mut self) -> Result<(), StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT key, value FROM entries \
             WHERE bucket = ?1 AND key > ?2 \
             ORDER BY key ASC LIMIT ?3",
        )?;
        let rows = stmt.query_map(
            params![self.bucket, self.after, PAGE_SIZE as i64],
            |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?)),
        )?;
        for row in rows {
            self.page.push_back(row?);
        }

        if self.page.len() < PAGE_SIZE {
            self.exhausted = true;
        }
        if let Some((last, _)) = self.page.back() {
            self.after = last.clone();
        }
        Ok(())
    }
}

impl Iterator for Entries<'_> {
    type Item = Result<(Vec<u8>, Vec<u8>), StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.page.is_empty() && !self.exhausted {
            if let Err(err) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
        self.page.pop_front().map(Ok)
    }
}
