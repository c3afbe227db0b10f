//! Blocking execution of external commands.

use std::path::Path;
use std::process::{Command, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ProcessError;

/// Interval between child status checks.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A shared flag that asks a running command to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; the child is killed at the next poll.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Limits applied to a command run by [`invoke`].
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    /// Kill the command after this long.
    pub timeout: Option<Duration>,
    /// Kill the command once this flag is set.
    pub cancel: Option<CancelFlag>,
}

impl InvokeOptions {
    /// Options with a timeout and no cancellation.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            cancel: None,
        }
    }
}

/// Runs `command` (program followed by its arguments) in `working_dir`.
///
/// Blocks until the command exits; stdout and stderr are inherited so
/// generator output reaches the user directly. Succeeds only on exit
/// status 0.
pub fn invoke(
    command: &[String],
    working_dir: &Path,
    options: &InvokeOptions,
) -> Result<(), ProcessError> {
    let display = command.join(" ");
    let Some((program, args)) = command.split_first() else {
        return Err(ProcessError::Spawn {
            command: display,
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        });
    };
    if !working_dir.is_dir() {
        return Err(ProcessError::MissingResource {
            path: working_dir.to_path_buf(),
            what: "working directory".to_string(),
        });
    }

    if options.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
        return Err(ProcessError::Cancelled { command: display });
    }

    log::debug!("running `{display}` in {}", working_dir.display());
    let mut child = Command::new(program)
        .args(args)
        .current_dir(working_dir)
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            command: display.clone(),
            source,
        })?;

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::Spawn {
                    command: display,
                    source,
                });
            }
        }
        if options.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            let _ = child.kill();
            let _ = child.wait();
            log::warn!("cancelled `{display}`");
            return Err(ProcessError::Cancelled { command: display });
        }
        if let Some(timeout) = options.timeout {
            if start.elapsed() >= timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::Timeout {
                    command: display,
                    secs: timeout.as_secs(),
                });
            }
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    log::debug!("`{display}` finished in {:.1}s", start.elapsed().as_secs_f64());
    check_status(display, status)
}

fn check_status(command: String, status: ExitStatus) -> Result<(), ProcessError> {
    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(ProcessError::Exit { command, code }),
        None => Err(ProcessError::Terminated {
            command,
            signal: signal_of(status),
        }),
    }
}

#[cfg(unix)]
fn signal_of(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal_of(_status: ExitStatus) -> Option<i32> {
    None
}
