//! Error types for external process execution.

use std::path::PathBuf;

/// Errors raised while running an external command.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The command ran and exited with a non-zero status.
    #[error("`{command}` exited with status {code}")]
    Exit {
        /// The command line, for diagnostics.
        command: String,
        /// The exit status.
        code: i32,
    },

    /// The command was killed by a signal.
    #[error("`{command}` was terminated by signal {}", signal.map(|s| s.to_string()).unwrap_or_else(|| "?".to_string()))]
    Terminated {
        /// The command line, for diagnostics.
        command: String,
        /// The signal number, when the platform reports one.
        signal: Option<i32>,
    },

    /// The program could not be started.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        /// The command line, for diagnostics.
        command: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The command ran longer than the configured timeout and was killed.
    #[error("`{command}` timed out after {secs}s")]
    Timeout {
        /// The command line, for diagnostics.
        command: String,
        /// The timeout in seconds.
        secs: u64,
    },

    /// The command was cancelled and killed.
    #[error("`{command}` was cancelled")]
    Cancelled {
        /// The command line, for diagnostics.
        command: String,
    },

    /// A file or directory the command needs does not exist.
    #[error("missing {what}: {}", path.display())]
    MissingResource {
        /// The missing path.
        path: PathBuf,
        /// What the path was supposed to be.
        what: String,
    },
}

impl ProcessError {
    /// The exit status for [`ProcessError::Exit`].
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::Exit { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_display() {
        let err = ProcessError::Exit {
            command: "sbt".to_string(),
            code: 1,
        };
        assert_eq!(err.to_string(), "`sbt` exited with status 1");
        assert_eq!(err.exit_code(), Some(1));
    }

    #[test]
    fn terminated_display() {
        let err = ProcessError::Terminated {
            command: "sbt".to_string(),
            signal: Some(9),
        };
        assert!(err.to_string().ends_with("signal 9"));
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn missing_resource_display() {
        let err = ProcessError::MissingResource {
            path: PathBuf::from("ext/VexiiRiscv"),
            what: "generator checkout".to_string(),
        };
        assert_eq!(err.to_string(), "missing generator checkout: ext/VexiiRiscv");
    }

    #[test]
    fn timeout_display() {
        let err = ProcessError::Timeout {
            command: "sbt".to_string(),
            secs: 30,
        };
        assert!(err.to_string().contains("30s"));
    }
}
