//! Generator flag lists such as `--with-mul --fetch-l1-ways=2`.

use crate::error::ConfigError;
use crate::value::{BuildConfiguration, OptionValue};

/// Converts an option key into its generator flag name (`l2_bytes` → `l2-bytes`).
pub fn flag_name(key: &str) -> String {
    key.replace('_', "-")
}

/// Parses a whitespace-separated generator flag list into options.
///
/// `--name` becomes `name = true`, `--name=true|false` a boolean,
/// `--name=<integer>` an integer and any other value a string. Dashes in
/// names map to underscores. Later flags override earlier ones, matching
/// the last-wins parsing of the generators.
pub fn parse_flag_args(args: &str) -> Result<BuildConfiguration, ConfigError> {
    let mut config = BuildConfiguration::new();
    for token in args.split_whitespace() {
        let body = token
            .strip_prefix("--")
            .ok_or_else(|| ConfigError::InvalidFlag(token.to_string()))?;
        let (name, value) = match body.split_once('=') {
            Some((name, raw)) => (name, parse_value(raw)),
            None => (body, OptionValue::Bool(true)),
        };
        let key = name.replace('-', "_");
        config.insert(key, value).map_err(|e| match e {
            ConfigError::InvalidKey(_) => ConfigError::InvalidFlag(token.to_string()),
            other => other,
        })?;
    }
    Ok(config)
}

fn parse_value(raw: &str) -> OptionValue {
    match raw {
        "true" => OptionValue::Bool(true),
        "false" => OptionValue::Bool(false),
        _ => match raw.parse::<i64>() {
            Ok(i) if i.to_string() == raw => OptionValue::Int(i),
            _ => OptionValue::Str(raw.to_string()),
        },
    }
}
