//! Errors - エラー型と分類
//!
//! StoreError は store の全操作が返すエラーです。
//! CLI 側はメッセージ表示と exit code の判断に [`ErrorKind`] を使います。

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// ErrorKind は StoreError の分類
///
/// # 分類
/// - LockTimeout: 他プロセスが store を保持している
/// - IoFailure: disk / permission / engine のエラー（リトライしない）
/// - InvalidArgument: 呼び出し側の入力が不正（transaction は開かない）
/// - NotFound: 指定 position のタスクが存在しない
/// - TransactionAborted: transaction 内のエラーで全体が rollback された
/// - Closed: Closed 状態の handle に対する操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    LockTimeout,
    IoFailure,
    InvalidArgument,
    NotFound,
    TransactionAborted,
    Closed,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store {} is locked by another process (waited {waited:?})", .path.display())]
    LockTimeout { path: PathBuf, waited: Duration },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite: {0}")]
    Engine(#[from] rusqlite::Error),

    #[error("unsupported store format version {found} (supported: {supported})")]
    UnsupportedFormat { found: i64, supported: i64 },

    #[error("bucket {0:?} does not exist")]
    BucketNotFound(String),

    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    #[error("sequence exhausted for bucket {0:?}")]
    SequenceExhausted(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no task at position {position} (store holds {len})")]
    NotFound { position: usize, len: usize },

    #[error("write attempted in a read-only transaction")]
    ReadOnly,

    #[error("{op} aborted: {source}")]
    TransactionAborted {
        op: &'static str,
        #[source]
        source: Box<StoreError>,
    },

    #[error("store is closed")]
    Closed,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LockTimeout { .. } => ErrorKind::LockTimeout,
            Self::Io(_)
            | Self::Engine(_)
            | Self::UnsupportedFormat { .. }
            | Self::BucketNotFound(_)
            | Self::CorruptRecord(_)
            | Self::SequenceExhausted(_) => ErrorKind::IoFailure,
            Self::InvalidArgument(_) | Self::ReadOnly => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::TransactionAborted { .. } => ErrorKind::TransactionAborted,
            Self::Closed => ErrorKind::Closed,
        }
    }

    pub(crate) fn aborted(op: &'static str, source: StoreError) -> Self {
        Self::TransactionAborted {
            op,
            source: Box::new(source),
        }
    }

    /// TransactionAborted を剥がして最初の原因を返す
    pub fn root_cause(&self) -> &StoreError {
        match self {
            Self::TransactionAborted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::lock(StoreError::LockTimeout { path: "x.db".into(), waited: Duration::from_secs(1) }, ErrorKind::LockTimeout)]
    #[case::corrupt(StoreError::CorruptRecord("bad".into()), ErrorKind::IoFailure)]
    #[case::format(StoreError::UnsupportedFormat { found: 9, supported: 1 }, ErrorKind::IoFailure)]
    #[case::invalid(StoreError::InvalidArgument("x".into()), ErrorKind::InvalidArgument)]
    #[case::not_found(StoreError::NotFound { position: 3, len: 2 }, ErrorKind::NotFound)]
    #[case::closed(StoreError::Closed, ErrorKind::Closed)]
    fn kind_classifies_variants(#[case] err: StoreError, #[case] kind: ErrorKind) {
        assert_eq!(err.kind(), kind);
    }

    #[test]
    fn aborted_keeps_root_cause() {
        let err = StoreError::aborted(
            "add_task",
            StoreError::aborted("nested", StoreError::ReadOnly),
        );
        assert_eq!(err.kind(), ErrorKind::TransactionAborted);
        assert!(matches!(err.root_cause(), StoreError::ReadOnly));
        assert!(err.to_string().starts_with("add_task aborted"));
    }

    #[test]
    fn lock_timeout_message_names_path() {
        let err = StoreError::LockTimeout {
            path: "tasks.db".into(),
            waited: Duration::from_millis(1000),
        };
        assert!(err.to_string().contains("tasks.db"));
    }
}
