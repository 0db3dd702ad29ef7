//! tasks-core
//!
//! Persistence core for the `tasks` todo CLI: an embedded, transactional,
//! ordered key/value store holding tasks under auto-incrementing ids.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（TaskId, TaskText, Position, StoreState, errors）
//! - **ports**: 抽象化レイヤー（TaskStore）
//! - **store**: SQLite file 上の bucket / transaction / lock と TaskDb
//! - **impls**: 開発・テスト用の実装（InMemoryTaskStore）
//! - **config**: StoreConfig
//! - **observability**: StoreStats

pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use domain::{ErrorKind, Position, StoreError, StoreState, Task, TaskEntry, TaskId};
pub use ports::TaskStore;
pub use store::TaskDb;
