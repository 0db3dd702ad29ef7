//! Exclusive advisory lock on a sidecar `<db>.lock` file.
//!
//! flock は同一プロセス内でも file description 単位なので、
//! 2 つ目の `TaskDb::open` は別プロセスと同じく待たされます。

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::domain::StoreError;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Held for the lifetime of an open store; released on drop.
#[derive(Debug)]
pub(crate) struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// `target` のロックを最大 `timeout` まで待って取得する
    pub(crate) fn acquire(target: &Path, timeout: Duration) -> Result<Self, StoreError> {
        let path = lock_path_for(target);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        let started = Instant::now();
        loop {
            match fs2::FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    debug!(lock = %path.display(), waited = ?started.elapsed(), "store lock acquired");
                    return Ok(Self { file, path });
                }
                Err(err) if is_contended(&err) => {
                    let waited = started.elapsed();
                    if waited >= timeout {
                        return Err(StoreError::LockTimeout {
                            path: target.to_path_buf(),
                            waited,
                        });
                    }
                    thread::sleep(POLL_INTERVAL.min(timeout - waited));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(err) = fs2::FileExt::unlock(&self.file) {
            warn!(lock = %self.path.display(), error = %err, "failed to release store lock");
        } else {
            debug!(lock = %self.path.display(), "store lock released");
        }
    }
}

pub(crate) fn lock_path_for(target: &Path) -> PathBuf {
    let mut raw = target.as_os_str().to_owned();
    raw.push(".lock");
    PathBuf::from(raw)
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
