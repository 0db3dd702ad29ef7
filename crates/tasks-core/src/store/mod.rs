//! Store - embedded, transactional, ordered key/value engine on one SQLite file.
//!
//! # 依存順（葉から）
//! - schema: on-disk layout
//! - lock / tx: 排他 lock と transaction wrapper
//! - bucket: namespace + sequence allocator + cursor
//! - db: TaskDb（TaskStore の実装）

mod bucket;
mod db;
mod lock;
mod schema;
mod tx;

pub use self::bucket::{Bucket, Entries};
pub use self::db::{TASKS_BUCKET, TaskCursor, TaskDb};
pub use self::tx::Tx;
