//! Per-fingerprint build locks.
//!
//! A lock is a sentinel file created with `create_new`, so exactly one
//! process can hold it. The sentinel records the holder's pid and is
//! removed when the guard drops. A sentinel left behind by a process that
//! no longer exists is taken over instead of waited on.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::CacheError;

/// An acquired build lock.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    /// Acquires the lock at `path`, polling every `poll` until `timeout`.
    ///
    /// Returns the guard together with a flag telling whether the caller
    /// had to wait for another holder.
    pub fn acquire(
        path: &Path,
        timeout: Duration,
        poll: Duration,
    ) -> Result<(Self, bool), CacheError> {
        let start = Instant::now();
        let mut waited = false;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    if let Err(e) = writeln!(file, "{}", std::process::id()) {
                        let _ = std::fs::remove_file(path);
                        return Err(CacheError::io(path, e));
                    }
                    return Ok((
                        LockGuard {
                            path: path.to_path_buf(),
                        },
                        waited,
                    ));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if let Some(pid) = abandoned_by(path) {
                        log::warn!(
                            "taking over lock {} left by exited process {pid}",
                            path.display()
                        );
                        match std::fs::remove_file(path) {
                            Ok(()) => continue,
                            Err(e) if e.kind() == ErrorKind::NotFound => continue,
                            Err(e) => return Err(CacheError::io(path, e)),
                        }
                    }
                    if !waited {
                        log::info!("waiting for another build holding {}", path.display());
                        waited = true;
                    }
                    if start.elapsed() >= timeout {
                        return Err(CacheError::LockTimeout {
                            path: path.to_path_buf(),
                            waited_secs: start.elapsed().as_secs(),
                        });
                    }
                    std::thread::sleep(poll);
                }
                Err(e) => return Err(CacheError::io(path, e)),
            }
        }
    }

    /// Returns the sentinel path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The pid recorded in the sentinel at `path`, if that process is gone.
///
/// An unreadable or still empty sentinel belongs to a live holder that
/// has not written its pid yet.
fn abandoned_by(path: &Path) -> Option<u32> {
    let text = std::fs::read_to_string(path).ok()?;
    let pid: u32 = text.trim().parse().ok()?;
    (!process_alive(pid)).then_some(pid)
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    // EPERM still means the process exists.
    !matches!(kill(Pid::from_raw(raw), None::<Signal>), Err(Errno::ESRCH))
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("failed to release lock {}: {e}", self.path.display());
        }
    }
}
