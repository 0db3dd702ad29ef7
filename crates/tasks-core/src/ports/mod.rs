//! Ports - 抽象化レイヤー
//!
//! 各 trait は永続化の実装の詳細を隠蔽します。

pub mod task_store;

pub use self::task_store::TaskStore;
