//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use crate::value::{is_valid_key, OptionValue};
use std::path::Path;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "socgen.toml";

/// Loads and validates `<project_dir>/socgen.toml`.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig, ConfigError> {
    log::debug!("loading configuration from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `socgen.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.toolchain.build_tool.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "toolchain.build_tool must not be empty".to_string(),
        ));
    }
    if config.toolchain.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "toolchain.timeout_secs must be positive".to_string(),
        ));
    }
    if config.cache.lock_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cache.lock_timeout_secs must be positive".to_string(),
        ));
    }
    for key in config.soc.params.keys() {
        if !is_valid_key(key) {
            return Err(ConfigError::InvalidKey(key.clone()));
        }
    }
    for feature in &config.soc.features {
        if feature.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "soc.features contains an empty name".to_string(),
            ));
        }
    }
    for (key, value) in config.cpu.inline.iter().chain(config.cpu.options.iter()) {
        OptionValue::from_toml(key, value)?;
    }
    Ok(())
}
