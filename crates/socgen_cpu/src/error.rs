//! Error types for CPU selection and netlist builds.

use std::path::PathBuf;

use socgen_cache::CacheError;
use socgen_config::ConfigError;
use socgen_invoke::ProcessError;

/// Errors raised while selecting, configuring or building a CPU.
#[derive(Debug, thiserror::Error)]
pub enum CpuError {
    /// The CPU name is not in the registry.
    #[error("unsupported CPU '{name}', supported are: {}", available.join(", "))]
    UnknownCpu {
        /// The requested name.
        name: String,
        /// Every supported CPU name.
        available: Vec<String>,
    },

    /// The CPU exists but does not have the requested variant.
    #[error("unsupported variant '{variant}' for CPU {cpu}, supported are: {}", available.join(", "))]
    UnknownVariant {
        /// The CPU name.
        cpu: String,
        /// The requested variant.
        variant: String,
        /// Every variant of the CPU.
        available: Vec<String>,
    },

    /// A source file the CPU needs does not exist.
    #[error("missing {what}: {}", path.display())]
    MissingResource {
        /// The missing path.
        path: PathBuf,
        /// What the file is for.
        what: String,
    },

    /// The generated parameter file could not be understood.
    #[error("{}:{line}: {reason}", path.display())]
    ParamsFile {
        /// The parameter file.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What is wrong with the line.
        reason: String,
    },

    /// An option is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The netlist cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The external generator failed.
    #[error(transparent)]
    Process(#[from] ProcessError),
}
