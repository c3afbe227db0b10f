//! Configuration types deserialized from `socgen.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::value::{BuildConfiguration, OptionValue};

/// The top-level project configuration parsed from `socgen.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Project metadata.
    pub project: ProjectMeta,
    /// Board, CPU and SoC parameter selection.
    #[serde(default)]
    pub soc: SocSection,
    /// Generator options for the selected CPU.
    #[serde(default)]
    pub cpu: CpuSection,
    /// Locations and behavior of the external generator toolchain.
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    /// Netlist cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Core project metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
}

/// The `[soc]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SocSection {
    /// Target board name.
    pub board: Option<String>,
    /// CPU name (`vexriscv_smp`, `vexiiriscv` or `none`).
    pub cpu: Option<String>,
    /// CPU variant; the CPU's default is used when absent.
    pub variant: Option<String>,
    /// Board features to integrate (e.g. `ethernet`, `sdcard`).
    ///
    /// Accepts a single string or a list of strings.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub features: Vec<String>,
    /// SoC parameter overrides applied on top of the board defaults.
    #[serde(default)]
    pub params: BTreeMap<String, toml::Value>,
}

/// The `[cpu]` section.
///
/// Besides the named fields, any other key is taken as a generator option,
/// as are the keys of the nested `[cpu.options]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CpuSection {
    /// Additional generator flags, e.g. `"--with-rvc --lsu-l1-ways=8"`.
    #[serde(default)]
    pub extra_args: String,
    /// Custom function unit source file (VexRiscv SMP `+cfu` variants).
    pub cfu: Option<PathBuf>,
    /// CXU source files (VexRiscv SMP `+cxu` variants).
    #[serde(default)]
    pub cxus: Vec<PathBuf>,
    /// Explicit generator options.
    #[serde(default)]
    pub options: BTreeMap<String, toml::Value>,
    /// Generator options given directly in `[cpu]`.
    #[serde(flatten)]
    pub inline: BTreeMap<String, toml::Value>,
}

impl CpuSection {
    /// Converts the inline options and then the `[cpu.options]` table into
    /// a build configuration. A key present in both takes the table's value.
    pub fn option_overrides(&self) -> Result<BuildConfiguration, ConfigError> {
        let mut config = BuildConfiguration::new();
        for (key, value) in self.inline.iter().chain(self.options.iter()) {
            config.insert(key.clone(), OptionValue::from_toml(key, value)?)?;
        }
        Ok(config)
    }
}

/// The `[toolchain]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Build tool used to run the Scala generators.
    pub build_tool: String,
    /// VexRiscv generator checkout.
    pub vexriscv_dir: PathBuf,
    /// VexiiRiscv generator checkout.
    pub vexiiriscv_dir: PathBuf,
    /// Repository cloned into `vexriscv_dir` when `auto_clone` is set.
    pub vexriscv_repo: String,
    /// Branch of `vexriscv_repo`.
    pub vexriscv_branch: String,
    /// Repository cloned into `vexiiriscv_dir` when `auto_clone` is set.
    pub vexiiriscv_repo: String,
    /// Branch of `vexiiriscv_repo`.
    pub vexiiriscv_branch: String,
    /// Clone a missing generator checkout instead of failing.
    pub auto_clone: bool,
    /// Generator timeout in seconds; unlimited when absent.
    pub timeout_secs: Option<u64>,
    /// Directory holding the RAM models added next to the netlist.
    pub support_dir: PathBuf,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            build_tool: "sbt".to_string(),
            vexriscv_dir: PathBuf::from("ext/VexRiscv"),
            vexiiriscv_dir: PathBuf::from("ext/VexiiRiscv"),
            vexriscv_repo: "https://github.com/SpinalHDL/VexRiscv.git".to_string(),
            vexriscv_branch: "master".to_string(),
            vexiiriscv_repo: "https://github.com/pmozil/VexiiRiscv.git".to_string(),
            vexiiriscv_branch: "dev".to_string(),
            auto_clone: false,
            timeout_secs: None,
            support_dir: PathBuf::from("ext/verilog"),
        }
    }
}

/// The `[cache]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Root of the netlist cache; each CPU family uses a subdirectory.
    pub dir: PathBuf,
    /// How long to wait for another process building the same netlist.
    pub lock_timeout_secs: u64,
    /// Always rerun the generators, overwriting cached netlists.
    pub no_netlist_cache: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".socgen-cache"),
            lock_timeout_secs: 3600,
            no_netlist_cache: false,
        }
    }
}

/// Deserializes a field that can be either a single string or a list of strings.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn features_single_string() {
        let toml = r#"
[project]
name = "test"

[soc]
features = "ethernet"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.soc.features, vec!["ethernet"]);
    }

    #[test]
    fn features_list() {
        let toml = r#"
[project]
name = "test"

[soc]
features = ["ethernet", "sdcard"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.soc.features, vec!["ethernet", "sdcard"]);
    }

    #[test]
    fn cpu_inline_and_table_options() {
        let toml = r#"
[project]
name = "test"

[cpu]
cpu_count = 2
l2_ways = 4
extra_args = "--with-rvc"

[cpu.options]
l2_ways = 8
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.cpu.extra_args, "--with-rvc");
        let opts = config.cpu.option_overrides().unwrap();
        assert_eq!(opts.get("cpu_count"), Some(&OptionValue::Int(2)));
        assert_eq!(opts.get("l2_ways"), Some(&OptionValue::Int(8)));
        assert!(!opts.contains("extra_args"));
    }

    #[test]
    fn cpu_float_option_is_rejected() {
        let toml = r#"
[project]
name = "test"

[cpu]
l2_bytes = 1.5
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(matches!(
            config.cpu.option_overrides(),
            Err(ConfigError::UnsupportedValue { .. })
        ));
    }

    #[test]
    fn toolchain_defaults() {
        let tc = ToolchainConfig::default();
        assert_eq!(tc.build_tool, "sbt");
        assert_eq!(tc.vexiiriscv_branch, "dev");
        assert!(!tc.auto_clone);
        assert_eq!(tc.timeout_secs, None);
    }

    #[test]
    fn partial_toolchain_keeps_defaults() {
        let toml = r#"
[project]
name = "test"

[toolchain]
auto_clone = true
timeout_secs = 900
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(config.toolchain.auto_clone);
        assert_eq!(config.toolchain.timeout_secs, Some(900));
        assert_eq!(config.toolchain.vexriscv_dir, PathBuf::from("ext/VexRiscv"));
        assert_eq!(config.cache.lock_timeout_secs, 3600);
    }
}
