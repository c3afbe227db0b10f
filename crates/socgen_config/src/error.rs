//! Error types for build configurations and `socgen.toml` loading.

/// Errors raised while assembling or validating configuration.
///
/// Every variant is detected before any external generator is spawned and
/// is fatal to the current build.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required field is missing after merging file and command line.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// An option key cannot be rendered as a generator flag.
    #[error("invalid option name '{0}' (expected lowercase letters, digits and '_')")]
    InvalidKey(String),

    /// An option value has a type the generators cannot consume.
    #[error("unsupported value for option '{key}': {found}")]
    UnsupportedValue {
        /// The option key.
        key: String,
        /// Description of the rejected value.
        found: String,
    },

    /// A token in a generator flag list is not a `--flag`.
    #[error("invalid generator flag '{0}' (expected --name or --name=value)")]
    InvalidFlag(String),
}
