//! Canonical serialization of build configurations.
//!
//! The canonical form is `key=value` entries sorted by key and joined by
//! `|`, e.g. `cpu_count=1|l2_bytes=0|xlen=32`. Only keys are sorted: list
//! values are written in their stored order because the generators treat
//! that order as meaningful.

use socgen_common::Fingerprint;

use crate::error::ConfigError;
use crate::value::{is_valid_key, BuildConfiguration, OptionValue, Scalar};

/// Serializes `config` into its canonical byte form.
pub fn canonicalize(config: &BuildConfiguration) -> Result<Vec<u8>, ConfigError> {
    canonical_string(config).map(String::into_bytes)
}

/// Serializes `config` into its canonical textual form.
pub fn canonical_string(config: &BuildConfiguration) -> Result<String, ConfigError> {
    let mut entries: Vec<(&str, &OptionValue)> = config.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut out = String::new();
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if !is_valid_key(key) {
            return Err(ConfigError::InvalidKey(key.to_string()));
        }
        if i > 0 {
            out.push('|');
        }
        out.push_str(key);
        out.push('=');
        write_value(&mut out, key, value)?;
    }
    Ok(out)
}

/// Computes the build fingerprint of `config`.
pub fn fingerprint(config: &BuildConfiguration) -> Result<Fingerprint, ConfigError> {
    let bytes = canonicalize(config)?;
    Ok(Fingerprint::of(&bytes))
}

fn write_value(out: &mut String, key: &str, value: &OptionValue) -> Result<(), ConfigError> {
    match value {
        OptionValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        OptionValue::Int(i) => out.push_str(&i.to_string()),
        OptionValue::Str(s) => escape_into(out, s),
        OptionValue::Strings(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(';');
                }
                escape_into(out, item);
            }
            out.push(']');
        }
        OptionValue::Tuples(tuples) => {
            out.push('[');
            for (i, tuple) in tuples.iter().enumerate() {
                if tuple.is_empty() {
                    return Err(ConfigError::UnsupportedValue {
                        key: key.to_string(),
                        found: "empty tuple".to_string(),
                    });
                }
                if i > 0 {
                    out.push(';');
                }
                for (j, field) in tuple.iter().enumerate() {
                    if j > 0 {
                        out.push(',');
                    }
                    match field {
                        Scalar::Int(v) => out.push_str(&v.to_string()),
                        Scalar::Str(s) => escape_into(out, s),
                    }
                }
            }
            out.push(']');
        }
    }
    Ok(())
}

fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        if matches!(c, '\\' | '|' | '=' | ',' | ';' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_config() -> BuildConfiguration {
        let mut cfg = BuildConfiguration::new();
        cfg.insert("xlen", 32i64).unwrap();
        cfg.insert("cpu_count", 1i64).unwrap();
        cfg.insert("l2_bytes", 0i64).unwrap();
        cfg
    }

    #[test]
    fn scenario_canonical_form() {
        let bytes = canonicalize(&scenario_config()).unwrap();
        assert_eq!(bytes, b"cpu_count=1|l2_bytes=0|xlen=32");
    }

    #[test]
    fn key_order_does_not_matter() {
        let mut permuted = BuildConfiguration::new();
        permuted.insert("l2_bytes", 0i64).unwrap();
        permuted.insert("xlen", 32i64).unwrap();
        permuted.insert("cpu_count", 1i64).unwrap();
        assert_eq!(
            canonicalize(&scenario_config()).unwrap(),
            canonicalize(&permuted).unwrap()
        );
        assert_eq!(
            fingerprint(&scenario_config()).unwrap(),
            fingerprint(&permuted).unwrap()
        );
    }

    #[test]
    fn list_order_is_preserved() {
        let mut a = BuildConfiguration::new();
        a.insert("video", OptionValue::Strings(vec!["a".into(), "b".into()]))
            .unwrap();
        let mut b = BuildConfiguration::new();
        b.insert("video", OptionValue::Strings(vec!["b".into(), "a".into()]))
            .unwrap();
        assert_eq!(canonical_string(&a).unwrap(), "video=[a;b]");
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn tuples_use_fixed_field_order() {
        let mut cfg = BuildConfiguration::new();
        cfg.insert(
            "memory_region",
            OptionValue::Tuples(vec![
                vec![0.into(), 0x10000.into(), "rx".into(), "p".into()],
                vec![
                    0x4000_0000.into(),
                    0x100_0000.into(),
                    "rwxc".into(),
                    "m".into(),
                ],
            ]),
        )
        .unwrap();
        assert_eq!(
            canonical_string(&cfg).unwrap(),
            "memory_region=[0,65536,rx,p;1073741824,16777216,rwxc,m]"
        );
    }

    #[test]
    fn booleans_and_strings() {
        let mut cfg = BuildConfiguration::new();
        cfg.insert("with_rvc", true).unwrap();
        cfg.insert("with_dma", false).unwrap();
        cfg.insert("netlist_name", "a|b=c").unwrap();
        assert_eq!(
            canonical_string(&cfg).unwrap(),
            "netlist_name=a\\|b\\=c|with_dma=false|with_rvc=true"
        );
    }

    #[test]
    fn escaping_keeps_distinct_values_distinct() {
        let mut a = BuildConfiguration::new();
        a.insert("x", "1|y=2").unwrap();
        let mut b = BuildConfiguration::new();
        b.insert("x", "1").unwrap();
        b.insert("y", "2").unwrap();
        assert_ne!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
    }

    #[test]
    fn value_change_changes_fingerprint() {
        let mut changed = scenario_config();
        changed.insert("l2_bytes", 131072i64).unwrap();
        assert_ne!(
            fingerprint(&scenario_config()).unwrap(),
            fingerprint(&changed).unwrap()
        );
    }

    #[test]
    fn empty_tuple_is_rejected() {
        let mut cfg = BuildConfiguration::new();
        cfg.insert("memory_region", OptionValue::Tuples(vec![vec![]]))
            .unwrap();
        assert!(matches!(
            canonicalize(&cfg),
            Err(ConfigError::UnsupportedValue { .. })
        ));
    }

    #[test]
    fn empty_configuration() {
        assert_eq!(canonical_string(&BuildConfiguration::new()).unwrap(), "");
    }
}
