//! Repository lock
//!
//! Commit, merge and every other operation that writes more than one file hold
//! an exclusive advisory lock on `.stow/lock` for their whole duration. The
//! lock is released when the guard is dropped, on success and failure alike.

use crate::errors::{Error, IoContext, Result};
use file_guard::{FileGuard, Lock};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Held for as long as the repository is locked
pub struct RepositoryLock {
    _guard: FileGuard<Arc<File>>,
}

impl RepositoryLock {
    /// Take the lock, polling until `timeout` elapses
    ///
    /// Blocks the calling thread between attempts; async callers use
    /// [`RepositoryLock::acquire_async`].
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        let file = open_lock_file(path)?;
        let start = Instant::now();

        loop {
            match try_lock(&file, path, start, timeout)? {
                Some(lock) => return Ok(lock),
                None => std::thread::sleep(POLL_INTERVAL),
            }
        }
    }

    /// Same as [`RepositoryLock::acquire`], yielding to the runtime between attempts
    pub async fn acquire_async(path: &Path, timeout: Duration) -> Result<Self> {
        let file = open_lock_file(path)?;
        let start = Instant::now();

        loop {
            match try_lock(&file, path, start, timeout)? {
                Some(lock) => return Ok(lock),
                None => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }
    }
}

fn open_lock_file(path: &Path) -> Result<Arc<File>> {
    let file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .io_context("unable to open lock file", path)?;

    Ok(Arc::new(file))
}

/// One attempt; `Ok(None)` means busy with time left to retry
fn try_lock(
    file: &Arc<File>,
    path: &Path,
    start: Instant,
    timeout: Duration,
) -> Result<Option<RepositoryLock>> {
    match file_guard::try_lock(file.clone(), Lock::Exclusive, 0, 1) {
        Ok(guard) => {
            tracing::trace!(path = %path.display(), "repository locked");
            Ok(Some(RepositoryLock { _guard: guard }))
        }
        Err(_) if start.elapsed() >= timeout => {
            tracing::warn!(path = %path.display(), "repository lock unavailable");
            Err(Error::LockUnavailable(timeout.as_millis()))
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    #[test]
    fn lock_can_be_taken_again_after_release() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lock");

        {
            let _lock = RepositoryLock::acquire(&path, Duration::from_millis(100)).unwrap();
            assert!(path.exists());
        }

        assert!(RepositoryLock::acquire(&path, Duration::from_millis(100)).is_ok());
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent").join("lock");

        let result = RepositoryLock::acquire(&path, Duration::from_millis(10));

        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[tokio::test]
    async fn async_acquire_releases_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lock");

        {
            let _lock = RepositoryLock::acquire_async(&path, Duration::from_millis(100))
                .await
                .unwrap();
        }

        assert!(
            RepositoryLock::acquire_async(&path, Duration::from_millis(100))
                .await
                .is_ok()
        );
    }
}
