//! Reader for the parameter file produced by `PythonArgsGen`.
//!
//! The file is a list of `VexiiRiscv.<attr> = <value>` assignments. Only
//! integer, boolean and quoted string values occur; anything else is an
//! error rather than being guessed at.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::CpuError;

/// A value assigned in the parameter file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// `True` or `False`.
    Bool(bool),
    /// Decimal or `0x` hexadecimal integer.
    Int(i64),
    /// A single- or double-quoted string.
    Str(String),
}

/// Attributes read from a parameter file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedParams {
    values: BTreeMap<String, ParamValue>,
}

impl GeneratedParams {
    /// Reads and parses `path`.
    pub fn load(path: &Path) -> Result<Self, CpuError> {
        let text = std::fs::read_to_string(path).map_err(|e| CpuError::ParamsFile {
            path: path.to_path_buf(),
            line: 0,
            reason: e.to_string(),
        })?;
        Self::parse(path, &text)
    }

    /// Parses parameter file `text`; `path` is only used in errors.
    pub fn parse(path: &Path, text: &str) -> Result<Self, CpuError> {
        let mut values = BTreeMap::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fail = |reason: &str| CpuError::ParamsFile {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: reason.to_string(),
            };
            let (lhs, rhs) = line
                .split_once('=')
                .ok_or_else(|| fail("expected `VexiiRiscv.<name> = <value>`"))?;
            let attr = lhs
                .trim()
                .strip_prefix("VexiiRiscv.")
                .filter(|a| !a.is_empty())
                .ok_or_else(|| fail("assignment target is not a VexiiRiscv attribute"))?;
            let value = parse_value(rhs.trim())
                .ok_or_else(|| fail(&format!("unsupported value `{}`", rhs.trim())))?;
            values.insert(attr.to_string(), value);
        }
        Ok(Self { values })
    }

    /// Returns the value of `attr`.
    pub fn get(&self, attr: &str) -> Option<&ParamValue> {
        self.values.get(attr)
    }

    /// Returns `attr` if it is an integer.
    pub fn int(&self, attr: &str) -> Option<i64> {
        match self.values.get(attr) {
            Some(ParamValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns `attr` if it is a boolean.
    pub fn bool(&self, attr: &str) -> Option<bool> {
        match self.values.get(attr) {
            Some(ParamValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the file assigned nothing.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn parse_value(s: &str) -> Option<ParamValue> {
    match s {
        "True" => return Some(ParamValue::Bool(true)),
        "False" => return Some(ParamValue::Bool(false)),
        _ => {}
    }
    for quote in ['"', '\''] {
        if let Some(inner) = s
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return Some(ParamValue::Str(inner.to_string()));
        }
    }
    let int = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(&hex.replace('_', ""), 16).ok(),
        None => s.replace('_', "").parse::<i64>().ok(),
    };
    int.map(ParamValue::Int)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# generated
VexiiRiscv.xlen = 64
VexiiRiscv.with_rvc = True
VexiiRiscv.with_rvf = False
VexiiRiscv.internal_bus_width = 0x40
VexiiRiscv.netlist_name = \"VexiiRiscvLitex_abc\"

";

    #[test]
    fn parses_supported_values() {
        let params = GeneratedParams::parse(Path::new("p.py"), SAMPLE).unwrap();
        assert_eq!(params.len(), 5);
        assert_eq!(params.int("xlen"), Some(64));
        assert_eq!(params.bool("with_rvc"), Some(true));
        assert_eq!(params.bool("with_rvf"), Some(false));
        assert_eq!(params.int("internal_bus_width"), Some(64));
        assert_eq!(
            params.get("netlist_name"),
            Some(&ParamValue::Str("VexiiRiscvLitex_abc".to_string()))
        );
    }

    #[test]
    fn wrong_type_lookups_return_none() {
        let params = GeneratedParams::parse(Path::new("p.py"), SAMPLE).unwrap();
        assert_eq!(params.int("with_rvc"), None);
        assert_eq!(params.bool("missing"), None);
    }

    #[test]
    fn foreign_assignment_is_rejected() {
        let err = GeneratedParams::parse(Path::new("p.py"), "\nNaxRiscv.xlen = 32\n").unwrap_err();
        match err {
            CpuError::ParamsFile { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unsupported_value_is_rejected() {
        let err = GeneratedParams::parse(Path::new("p.py"), "VexiiRiscv.x = [1, 2]").unwrap_err();
        assert!(err.to_string().contains("unsupported value"));
    }

    #[test]
    fn missing_file_is_params_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GeneratedParams::load(&dir.path().join("absent.py")).unwrap_err();
        assert!(matches!(err, CpuError::ParamsFile { line: 0, .. }));
    }
}
