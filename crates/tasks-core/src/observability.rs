use serde::{Deserialize, Serialize};

/// Snapshot of the task bucket, for `tasks stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub tasks: usize,
    pub next_id: u64,
}
