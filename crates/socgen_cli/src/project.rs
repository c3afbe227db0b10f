//! Project discovery and SoC resolution shared by the commands.

use std::path::{Path, PathBuf};

use socgen_config::{
    load_config, load_config_file, resolve_soc, ProjectConfig, ResolvedSoc, SocOverrides,
    CONFIG_FILE,
};

use crate::{GlobalArgs, SocArgs};

/// Walks up from `start` looking for the nearest directory containing `socgen.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Loads the project configuration and returns it with the project directory.
///
/// With `--config`, a file is loaded as is and its parent is the project
/// directory; a directory is searched for `socgen.toml`. Otherwise the
/// current directory and its parents are searched.
pub fn load_project(
    global: &GlobalArgs,
) -> Result<(PathBuf, ProjectConfig), Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            let dir = p
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            return Ok((dir, load_config_file(&p)?));
        }
        return Ok((p.clone(), load_config(&p)?));
    }
    let dir = find_project_root(&std::env::current_dir()?)?;
    let config = load_config(&dir)?;
    Ok((dir, config))
}

/// The overrides `args` make to the project's `[soc]` section.
pub fn overrides(args: &SocArgs) -> SocOverrides {
    SocOverrides {
        board: args.board.clone(),
        cpu: args.cpu.clone(),
        variant: args.variant.clone(),
        features: args.features.clone(),
        ..SocOverrides::default()
    }
}

/// Loads the project and resolves its SoC with `overrides` applied.
pub fn load_soc(
    global: &GlobalArgs,
    overrides: &SocOverrides,
) -> Result<(PathBuf, ResolvedSoc), Box<dyn std::error::Error>> {
    let (dir, config) = load_project(global)?;
    let soc = resolve_soc(&config, &dir, overrides)?;
    Ok((dir, soc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PROJECT: &str = "[project]\nname = \"t\"\n[soc]\nboard = \"arty\"\ncpu = \"vexiiriscv\"\n";

    fn global(config: Option<&Path>) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            config: config.map(|p| p.to_str().unwrap().to_string()),
        }
    }

    #[test]
    fn find_root_in_parent() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), PROJECT).unwrap();
        let nested = tmp.path().join("rtl").join("cores");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_root(&nested).unwrap(), tmp.path());
    }

    #[test]
    fn find_root_fails_without_config() {
        let tmp = TempDir::new().unwrap();
        let err = find_project_root(tmp.path()).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn load_from_config_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, PROJECT).unwrap();
        let (dir, config) = load_project(&global(Some(&path))).unwrap();
        assert_eq!(dir, tmp.path());
        assert_eq!(config.project.name, "t");
    }

    #[test]
    fn load_from_config_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), PROJECT).unwrap();
        let (dir, _) = load_project(&global(Some(tmp.path()))).unwrap();
        assert_eq!(dir, tmp.path());
    }

    #[test]
    fn cli_overrides_apply() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), PROJECT).unwrap();
        let args = SocArgs {
            board: Some("ulx3s".to_string()),
            features: vec!["leds".to_string()],
            ..SocArgs::default()
        };
        let (_, soc) = load_soc(&global(Some(tmp.path())), &overrides(&args)).unwrap();
        assert_eq!(soc.board, "ulx3s");
        assert_eq!(soc.cpu, "vexiiriscv");
        assert_eq!(soc.features, vec!["leds"]);
        assert_eq!(soc.cache.dir, tmp.path().join(".socgen-cache"));
    }
}
