//! Impls - 開発・テスト用の実装

pub mod memory;

pub use self::memory::InMemoryTaskStore;
