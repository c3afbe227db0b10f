//! Rendering build configurations as generator flags.

use socgen_config::{flag_name, BuildConfiguration, OptionValue, Scalar};

/// Renders `config` as generator command-line arguments, in insertion order.
///
/// * `Bool(true)` → `--flag`; `Bool(false)` is omitted
/// * `Int` / `Str` → `--flag=value`
/// * `Strings` → `--flag value` for each entry (two arguments each)
/// * `Tuples` → `--flag=a,b,c` for each tuple
pub fn render_args(config: &BuildConfiguration) -> Vec<String> {
    let mut args = Vec::new();
    for (key, value) in config.iter() {
        let flag = format!("--{}", flag_name(key));
        match value {
            OptionValue::Bool(true) => args.push(flag),
            OptionValue::Bool(false) => {}
            OptionValue::Int(i) => args.push(format!("{flag}={i}")),
            OptionValue::Str(s) => args.push(format!("{flag}={s}")),
            OptionValue::Strings(items) => {
                for item in items {
                    args.push(flag.clone());
                    args.push(item.clone());
                }
            }
            OptionValue::Tuples(tuples) => {
                for tuple in tuples {
                    let fields: Vec<String> = tuple.iter().map(Scalar::to_string).collect();
                    args.push(format!("{flag}={}", fields.join(",")));
                }
            }
        }
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_each_kind() {
        let mut cfg = BuildConfiguration::new();
        cfg.insert("cpu_count", 2i64).unwrap();
        cfg.insert("with_dma", true).unwrap();
        cfg.insert("with_axi3", false).unwrap();
        cfg.insert("netlist_name", "cluster").unwrap();
        cfg.insert(
            "memory_region",
            OptionValue::Tuples(vec![
                vec![0.into(), 65536.into(), "rx".into(), "p".into()],
                vec![1073741824.into(), 16777216.into(), "rwxc".into(), "m".into()],
            ]),
        )
        .unwrap();
        cfg.insert("video", OptionValue::Strings(vec!["name=a".into()]))
            .unwrap();

        assert_eq!(
            render_args(&cfg),
            vec![
                "--cpu-count=2",
                "--with-dma",
                "--netlist-name=cluster",
                "--memory-region=0,65536,rx,p",
                "--memory-region=1073741824,16777216,rwxc,m",
                "--video",
                "name=a",
            ]
        );
    }

    #[test]
    fn keeps_insertion_order() {
        let mut cfg = BuildConfiguration::new();
        cfg.insert("zeta", 1i64).unwrap();
        cfg.insert("alpha", 2i64).unwrap();
        assert_eq!(render_args(&cfg), vec!["--zeta=1", "--alpha=2"]);
    }

    #[test]
    fn empty_lists_render_nothing() {
        let mut cfg = BuildConfiguration::new();
        cfg.insert("mac_sg", OptionValue::Strings(vec![])).unwrap();
        assert!(render_args(&cfg).is_empty());
    }
}
