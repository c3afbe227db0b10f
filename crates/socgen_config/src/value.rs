//! Option values and the ordered build configuration.

use std::fmt;

use crate::error::ConfigError;

/// A single field inside a tuple-valued option.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scalar {
    /// An integer field.
    Int(i64),
    /// A string field.
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

/// The value of one generator option.
///
/// List values keep their order: for the generators the order of
/// `--memory-region` or `--video` entries is significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OptionValue {
    /// A boolean flag; only `true` is passed to the generator.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A string.
    Str(String),
    /// A list passed as repeated `--flag value` pairs.
    Strings(Vec<String>),
    /// A list of tuples passed as repeated `--flag=a,b,c`.
    Tuples(Vec<Vec<Scalar>>),
}

impl OptionValue {
    /// Converts an unsigned quantity (sizes, addresses) into an integer value.
    pub fn from_u64(key: &str, v: u64) -> Result<Self, ConfigError> {
        i64::try_from(v)
            .map(OptionValue::Int)
            .map_err(|_| ConfigError::UnsupportedValue {
                key: key.to_string(),
                found: format!("integer {v} out of range"),
            })
    }

    /// Converts a TOML value into an option value.
    ///
    /// Booleans, integers, strings, arrays of strings and arrays of
    /// arrays of integers/strings are accepted. Anything else fails with
    /// [`ConfigError::UnsupportedValue`].
    pub fn from_toml(key: &str, value: &toml::Value) -> Result<Self, ConfigError> {
        let unsupported = |found: String| ConfigError::UnsupportedValue {
            key: key.to_string(),
            found,
        };
        match value {
            toml::Value::Boolean(b) => Ok(OptionValue::Bool(*b)),
            toml::Value::Integer(i) => Ok(OptionValue::Int(*i)),
            toml::Value::String(s) => Ok(OptionValue::Str(s.clone())),
            toml::Value::Float(f) => Err(unsupported(format!("float {f}"))),
            toml::Value::Datetime(d) => Err(unsupported(format!("datetime {d}"))),
            toml::Value::Table(_) => Err(unsupported("table".to_string())),
            toml::Value::Array(items) if items.iter().all(|v| v.is_str()) => Ok(
                OptionValue::Strings(
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                ),
            ),
            toml::Value::Array(items) => {
                let mut tuples = Vec::with_capacity(items.len());
                for item in items {
                    let fields = item.as_array().ok_or_else(|| {
                        unsupported(format!("mixed array element {item}"))
                    })?;
                    if fields.is_empty() {
                        return Err(unsupported("empty tuple".to_string()));
                    }
                    let mut tuple = Vec::with_capacity(fields.len());
                    for field in fields {
                        match field {
                            toml::Value::Integer(i) => tuple.push(Scalar::Int(*i)),
                            toml::Value::String(s) => tuple.push(Scalar::Str(s.clone())),
                            other => {
                                return Err(unsupported(format!("tuple field {other}")));
                            }
                        }
                    }
                    tuples.push(tuple);
                }
                Ok(OptionValue::Tuples(tuples))
            }
        }
    }

    /// Returns the integer payload, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Int(v)
    }
}

impl From<u32> for OptionValue {
    fn from(v: u32) -> Self {
        OptionValue::Int(i64::from(v))
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Str(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Str(v)
    }
}

/// Returns `true` if `key` can be rendered as a generator flag name.
pub(crate) fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('_')
        && key
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// All options that affect one generated netlist.
///
/// Entries keep insertion order, which is the order flags are passed to
/// the generator. Equality and fingerprints ignore that order: two
/// configurations with the same key/value pairs are the same build.
#[derive(Debug, Clone, Default)]
pub struct BuildConfiguration {
    entries: Vec<(String, OptionValue)>,
}

impl BuildConfiguration {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any previous value in place.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<OptionValue>,
    ) -> Result<(), ConfigError> {
        let key = key.into();
        if !is_valid_key(&key) {
            return Err(ConfigError::InvalidKey(key));
        }
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
        Ok(())
    }

    /// Copies every entry of `other` into `self`; `other` wins on conflicts.
    pub fn merge(&mut self, other: &BuildConfiguration) {
        for (key, value) in &other.entries {
            match self.entries.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = value.clone(),
                None => self.entries.push((key.clone(), value.clone())),
            }
        }
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Removes and returns the value stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns `true` if `key` is present and set to `true`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(OptionValue::as_bool).unwrap_or(false)
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for BuildConfiguration {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for BuildConfiguration {}
