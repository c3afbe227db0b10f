//! Error types for cache operations.

use std::path::PathBuf;

use socgen_config::ConfigError;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A sidecar entry could not be serialized or parsed.
    #[error("invalid cache entry {path}: {reason}")]
    Entry {
        /// The sidecar file path.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// The generator reported success but did not write the expected file.
    #[error("generator finished without producing {path}")]
    MissingArtifact {
        /// The file the generator was expected to write.
        path: PathBuf,
    },

    /// Another build of the same fingerprint held the lock for too long.
    #[error("timed out after {waited_secs}s waiting for build lock {path} (remove it if no build is running)")]
    LockTimeout {
        /// The lock sentinel path.
        path: PathBuf,
        /// Seconds spent waiting.
        waited_secs: u64,
    },

    /// The build configuration could not be canonicalized.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = CacheError::Io {
            path: PathBuf::from("/tmp/cache/abc.v"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("cache I/O error"));
        assert!(msg.contains("abc.v"));
    }

    #[test]
    fn missing_artifact_display() {
        let err = CacheError::MissingArtifact {
            path: PathBuf::from("staging/abc.v"),
        };
        assert_eq!(
            err.to_string(),
            "generator finished without producing staging/abc.v"
        );
    }

    #[test]
    fn lock_timeout_display() {
        let err = CacheError::LockTimeout {
            path: PathBuf::from("abc.v.lock"),
            waited_secs: 30,
        };
        let msg = err.to_string();
        assert!(msg.contains("30s"));
        assert!(msg.contains("abc.v.lock"));
    }

    #[test]
    fn config_error_is_transparent() {
        let err = CacheError::from(ConfigError::InvalidKey("Bad".to_string()));
        assert!(err.to_string().starts_with("invalid option name 'Bad'"));
    }
}
