//! SoC resolution: merging the configuration file with command-line overrides.

use crate::error::ConfigError;
use crate::types::{CacheConfig, ProjectConfig, ToolchainConfig};
use crate::value::BuildConfiguration;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Command-line values that take precedence over `socgen.toml`.
#[derive(Debug, Clone, Default)]
pub struct SocOverrides {
    /// Replaces `soc.board`.
    pub board: Option<String>,
    /// Replaces `soc.cpu`.
    pub cpu: Option<String>,
    /// Replaces `soc.variant`.
    pub variant: Option<String>,
    /// Appended to `soc.features`.
    pub features: Vec<String>,
    /// Forces `cache.no_netlist_cache` on.
    pub no_netlist_cache: bool,
    /// Replaces `toolchain.timeout_secs`.
    pub timeout_secs: Option<u64>,
}

/// A fully resolved SoC request with file settings and overrides merged.
///
/// Relative paths from the configuration file are resolved against the
/// project directory.
#[derive(Debug, Clone)]
pub struct ResolvedSoc {
    /// The project name.
    pub name: String,
    /// Target board name.
    pub board: String,
    /// CPU name.
    pub cpu: String,
    /// CPU variant, if one was requested.
    pub variant: Option<String>,
    /// Requested board features, without duplicates, in request order.
    pub features: Vec<String>,
    /// SoC parameter overrides.
    pub params: BTreeMap<String, toml::Value>,
    /// Generator option overrides from `[cpu]`.
    pub cpu_options: BuildConfiguration,
    /// Additional generator flags.
    pub extra_args: String,
    /// CFU source file.
    pub cfu: Option<PathBuf>,
    /// CXU source files.
    pub cxus: Vec<PathBuf>,
    /// Toolchain settings with absolute checkout paths.
    pub toolchain: ToolchainConfig,
    /// Cache settings with an absolute cache directory.
    pub cache: CacheConfig,
}

/// Resolves the SoC to build from `config` and command-line `overrides`.
///
/// Fails with [`ConfigError::MissingField`] when no board or CPU is set by
/// either source.
pub fn resolve_soc(
    config: &ProjectConfig,
    project_dir: &Path,
    overrides: &SocOverrides,
) -> Result<ResolvedSoc, ConfigError> {
    let board = overrides
        .board
        .clone()
        .or_else(|| config.soc.board.clone())
        .ok_or_else(|| ConfigError::MissingField("soc.board".to_string()))?;
    let cpu = overrides
        .cpu
        .clone()
        .or_else(|| config.soc.cpu.clone())
        .ok_or_else(|| ConfigError::MissingField("soc.cpu".to_string()))?;
    let variant = overrides
        .variant
        .clone()
        .or_else(|| config.soc.variant.clone());

    let mut features: Vec<String> = Vec::new();
    for feature in config.soc.features.iter().chain(overrides.features.iter()) {
        if !features.contains(feature) {
            features.push(feature.clone());
        }
    }

    let mut toolchain = config.toolchain.clone();
    toolchain.vexriscv_dir = project_dir.join(&toolchain.vexriscv_dir);
    toolchain.vexiiriscv_dir = project_dir.join(&toolchain.vexiiriscv_dir);
    toolchain.support_dir = project_dir.join(&toolchain.support_dir);
    if overrides.timeout_secs.is_some() {
        toolchain.timeout_secs = overrides.timeout_secs;
    }

    let mut cache = config.cache.clone();
    cache.dir = project_dir.join(&cache.dir);
    cache.no_netlist_cache |= overrides.no_netlist_cache;

    Ok(ResolvedSoc {
        name: config.project.name.clone(),
        board,
        cpu,
        variant,
        features,
        params: config.soc.params.clone(),
        cpu_options: config.cpu.option_overrides()?,
        extra_args: config.cpu.extra_args.clone(),
        cfu: config.cpu.cfu.as_ref().map(|p| project_dir.join(p)),
        cxus: config.cpu.cxus.iter().map(|p| project_dir.join(p)).collect(),
        toolchain,
        cache,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;
    use crate::value::OptionValue;

    const CONFIG: &str = r#"
[project]
name = "linux-soc"

[soc]
board = "arty"
cpu = "vexiiriscv"
features = ["ethernet"]

[cpu]
cpu_count = 2
cxus = ["cxu/a.v"]

[cache]
dir = "cache"
"#;

    #[test]
    fn file_values_are_used() {
        let config = load_config_from_str(CONFIG).unwrap();
        let soc = resolve_soc(&config, Path::new("/proj"), &SocOverrides::default()).unwrap();
        assert_eq!(soc.board, "arty");
        assert_eq!(soc.cpu, "vexiiriscv");
        assert_eq!(soc.variant, None);
        assert_eq!(soc.features, vec!["ethernet"]);
        assert_eq!(soc.cpu_options.get("cpu_count"), Some(&OptionValue::Int(2)));
        assert_eq!(soc.cxus, vec![PathBuf::from("/proj/cxu/a.v")]);
        assert_eq!(soc.cache.dir, PathBuf::from("/proj/cache"));
        assert_eq!(
            soc.toolchain.vexiiriscv_dir,
            PathBuf::from("/proj/ext/VexiiRiscv")
        );
    }

    #[test]
    fn overrides_take_precedence() {
        let config = load_config_from_str(CONFIG).unwrap();
        let overrides = SocOverrides {
            board: Some("digilent_nexys4ddr".to_string()),
            variant: Some("debian".to_string()),
            features: vec!["sdcard".to_string(), "ethernet".to_string()],
            no_netlist_cache: true,
            timeout_secs: Some(60),
            ..Default::default()
        };
        let soc = resolve_soc(&config, Path::new("/proj"), &overrides).unwrap();
        assert_eq!(soc.board, "digilent_nexys4ddr");
        assert_eq!(soc.cpu, "vexiiriscv");
        assert_eq!(soc.variant.as_deref(), Some("debian"));
        assert_eq!(soc.features, vec!["ethernet", "sdcard"]);
        assert!(soc.cache.no_netlist_cache);
        assert_eq!(soc.toolchain.timeout_secs, Some(60));
    }

    #[test]
    fn absolute_paths_are_kept() {
        let toml = r#"
[project]
name = "t"

[soc]
board = "arty"
cpu = "vexriscv_smp"

[cache]
dir = "/var/cache/socgen"
"#;
        let config = load_config_from_str(toml).unwrap();
        let soc = resolve_soc(&config, Path::new("/proj"), &SocOverrides::default()).unwrap();
        assert_eq!(soc.cache.dir, PathBuf::from("/var/cache/socgen"));
    }

    #[test]
    fn missing_board_errors() {
        let config = load_config_from_str("[project]\nname = \"t\"\n").unwrap();
        let err = resolve_soc(&config, Path::new("."), &SocOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "soc.board"));
    }

    #[test]
    fn missing_cpu_errors() {
        let config = load_config_from_str("[project]\nname = \"t\"\n").unwrap();
        let overrides = SocOverrides {
            board: Some("arty".to_string()),
            ..Default::default()
        };
        let err = resolve_soc(&config, Path::new("."), &overrides).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "soc.cpu"));
    }
}
