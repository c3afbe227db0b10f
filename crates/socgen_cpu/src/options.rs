//! Typed access to user option overrides.

use socgen_config::{BuildConfiguration, ConfigError, OptionValue};

/// Takes typed options out of a set of user overrides.
///
/// Every `take_*` call removes the key, so whatever is left after the CPU
/// read its known options is passed to the generator unchanged.
#[derive(Debug, Clone)]
pub struct OptionReader {
    remaining: BuildConfiguration,
}

impl OptionReader {
    /// Starts reading from a copy of `overrides`.
    pub fn new(overrides: &BuildConfiguration) -> Self {
        Self {
            remaining: overrides.clone(),
        }
    }

    /// Takes an integer option, or `default` when absent.
    pub fn int(&mut self, key: &str, default: i64) -> Result<i64, ConfigError> {
        Ok(self.opt_int(key)?.unwrap_or(default))
    }

    /// Takes an integer option if present.
    pub fn opt_int(&mut self, key: &str) -> Result<Option<i64>, ConfigError> {
        match self.remaining.remove(key) {
            None => Ok(None),
            Some(OptionValue::Int(v)) => Ok(Some(v)),
            Some(other) => Err(mismatch(key, "an integer", &other)),
        }
    }

    /// Takes a bus width in bits, or `default` when absent.
    ///
    /// Widths are powers of two of at least 8 bits that fit in a `u32`.
    pub fn width(&mut self, key: &str, default: u32) -> Result<u32, ConfigError> {
        let Some(bits) = self.opt_int(key)? else {
            return Ok(default);
        };
        match u32::try_from(bits) {
            Ok(width) if width >= 8 && width.is_power_of_two() => Ok(width),
            _ => Err(ConfigError::UnsupportedValue {
                key: key.to_string(),
                found: format!("expected a bus width in bits, found integer {bits}"),
            }),
        }
    }

    /// Takes a boolean option, or `default` when absent.
    pub fn bool(&mut self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.remaining.remove(key) {
            None => Ok(default),
            Some(OptionValue::Bool(v)) => Ok(v),
            Some(other) => Err(mismatch(key, "a boolean", &other)),
        }
    }

    /// Takes a list of strings; a single string counts as a one-item list.
    pub fn strings(&mut self, key: &str) -> Result<Vec<String>, ConfigError> {
        match self.remaining.remove(key) {
            None => Ok(Vec::new()),
            Some(OptionValue::Strings(v)) => Ok(v),
            Some(OptionValue::Str(s)) => Ok(vec![s]),
            Some(other) => Err(mismatch(key, "a list of strings", &other)),
        }
    }

    /// Options nobody asked for, in their original order.
    pub fn finish(self) -> BuildConfiguration {
        self.remaining
    }
}

fn mismatch(key: &str, expected: &str, found: &OptionValue) -> ConfigError {
    let found = match found {
        OptionValue::Bool(b) => format!("boolean {b}"),
        OptionValue::Int(i) => format!("integer {i}"),
        OptionValue::Str(s) => format!("string \"{s}\""),
        OptionValue::Strings(_) => "list of strings".to_string(),
        OptionValue::Tuples(_) => "list of tuples".to_string(),
    };
    ConfigError::UnsupportedValue {
        key: key.to_string(),
        found: format!("expected {expected}, found {found}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides() -> BuildConfiguration {
        let mut cfg = BuildConfiguration::new();
        cfg.insert("cpu_count", 4i64).unwrap();
        cfg.insert("with_rvc", true).unwrap();
        cfg.insert("video", "framebuffer").unwrap();
        cfg.insert("custom_flag", 7i64).unwrap();
        cfg
    }

    #[test]
    fn typed_reads_with_defaults() {
        let mut r = OptionReader::new(&overrides());
        assert_eq!(r.int("cpu_count", 1).unwrap(), 4);
        assert_eq!(r.int("l2_ways", 4).unwrap(), 4);
        assert!(r.bool("with_rvc", false).unwrap());
        assert!(!r.bool("with_dma", false).unwrap());
        assert_eq!(r.strings("video").unwrap(), vec!["framebuffer"]);
        assert_eq!(r.opt_int("l2_self_flush").unwrap(), None);
    }

    #[test]
    fn leftovers_keep_unknown_options() {
        let mut r = OptionReader::new(&overrides());
        r.int("cpu_count", 1).unwrap();
        r.bool("with_rvc", false).unwrap();
        r.strings("video").unwrap();
        let rest = r.finish();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest.get("custom_flag"), Some(&OptionValue::Int(7)));
    }

    #[test]
    fn widths_are_checked() {
        let mut cfg = BuildConfiguration::new();
        cfg.insert("dbus_width", 128i64).unwrap();
        cfg.insert("ibus_width", -32i64).unwrap();
        cfg.insert("litedram_width", 1i64 << 40).unwrap();
        cfg.insert("mbus_width", 48i64).unwrap();
        let mut r = OptionReader::new(&cfg);
        assert_eq!(r.width("dbus_width", 32).unwrap(), 128);
        assert_eq!(r.width("absent_width", 32).unwrap(), 32);
        for key in ["ibus_width", "litedram_width", "mbus_width"] {
            match r.width(key, 32).unwrap_err() {
                ConfigError::UnsupportedValue { key: k, found } => {
                    assert_eq!(k, key);
                    assert!(found.starts_with("expected a bus width"), "{found}");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn type_mismatch_is_unsupported_value() {
        let mut r = OptionReader::new(&overrides());
        let err = r.bool("cpu_count", false).unwrap_err();
        match err {
            ConfigError::UnsupportedValue { key, found } => {
                assert_eq!(key, "cpu_count");
                assert_eq!(found, "expected a boolean, found integer 4");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
