//! Cross-process exclusive lock on a store file.

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Advisory lock held for as long as a file store is open.
///
/// The lock lives on a sidecar `<store>.lock` file, since compaction renames
/// a new file over the store itself.
#[derive(Debug)]
pub(crate) struct StoreLock {
    path: PathBuf,
    file: File,
}

impl StoreLock {
    /// Acquires the lock, waiting up to `timeout` for another holder.
    pub(crate) fn acquire(store_path: &Path, timeout: Duration) -> CoreResult<Self> {
        let path = lock_path(store_path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                CoreError::store_unavailable(format!("cannot open {}: {e}", path.display()))
            })?;

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(Self { path, file }),
                Err(_) if Instant::now() < deadline => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return Err(CoreError::store_unavailable(format!(
                        "{} is locked by another process ({e})",
                        store_path.display()
                    )));
                }
            }
        }
    }

    /// Path of the lock file.
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn lock_path(store_path: &Path) -> PathBuf {
    let mut name = store_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}
