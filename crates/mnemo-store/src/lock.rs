//! Advisory file lock around the store's read-modify-write cycle,
//! using the `flock(2)` syscall directly.
//!
//! The guard only needs to own the `File` (which owns the fd); `Drop`
//! calls `flock(fd, LOCK_UN)` for deterministic release. The lock is
//! blocking: a second process mutating the same project waits for the
//! current cycle to finish instead of racing it.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use mnemo_core::MemoryError;
use serde::{Deserialize, Serialize};

const LOCK_FILE: &str = "store.lock";

/// Diagnostic information written into the lock file after acquisition.
#[derive(Debug, Serialize, Deserialize)]
struct LockDiagnostic {
    pid: u32,
    acquired_at: DateTime<Utc>,
}

/// Exclusive advisory lock on one project's store.
///
/// Held for the duration of a read-modify-write cycle and released on
/// `Drop`.
pub(crate) struct StoreLock {
    /// The open lock file whose fd carries the flock.
    file: File,
    lock_path: PathBuf,
}

impl std::fmt::Debug for StoreLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreLock")
            .field("lock_path", &self.lock_path)
            .finish()
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        // If the unlock call fails the lock is still released when the
        // fd is closed moments later.
        flock_unlock(&self.file);
    }
}

impl StoreLock {
    /// Acquire a blocking exclusive lock inside `state_dir`.
    ///
    /// The caller must have created `state_dir` already (activation does).
    pub(crate) fn acquire(state_dir: &Path) -> Result<Self, MemoryError> {
        let lock_path = state_dir.join(LOCK_FILE);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|error| {
                MemoryError::storage(format!(
                    "cannot open lock file {}: {error}",
                    lock_path.display()
                ))
            })?;

        flock_exclusive(&file).map_err(|error| {
            MemoryError::storage(format!(
                "cannot lock store file {}: {error}",
                lock_path.display()
            ))
        })?;

        let mut lock = Self { file, lock_path };
        lock.write_diagnostic();
        Ok(lock)
    }

    /// Best-effort: the diagnostic only aids post-mortem debugging, so
    /// failures here never fail the operation that took the lock.
    fn write_diagnostic(&mut self) {
        let diagnostic = LockDiagnostic {
            pid: std::process::id(),
            acquired_at: Utc::now(),
        };
        if let Ok(json) = serde_json::to_string(&diagnostic) {
            let _ = self.file.set_len(0);
            let _ = self.file.write_all(json.as_bytes());
            let _ = self.file.flush();
        }
    }

    #[cfg(test)]
    pub(crate) fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

#[cfg(unix)]
fn flock_exclusive(file: &File) -> std::io::Result<()> {
    use std::os::unix::io::AsRawFd;

    // SAFETY: `fd` is a valid descriptor owned by `file`. LOCK_EX blocks
    // until the exclusive advisory lock is granted.
    let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
    if ret == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn flock_exclusive(_file: &File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn flock_unlock(file: &File) {
    use std::os::unix::io::AsRawFd;

    // SAFETY: `fd` is a valid descriptor owned by `file`; LOCK_UN
    // releases the advisory lock.
    unsafe {
        libc::flock(file.as_raw_fd(), libc::LOCK_UN);
    }
}

#[cfg(not(unix))]
fn flock_unlock(_file: &File) {}
