//! Scenario test helpers for socgen.
//!
//! Provides project configurations and a stand-in for the generator build
//! tool so integration tests can drive the real cache, invoker and SoC
//! builder without a JVM.

#![warn(missing_docs)]

use std::path::{Path, PathBuf};

use socgen_config::{resolve_soc, BuildConfiguration, ProjectConfig, ResolvedSoc, SocOverrides};

/// How the fake build tool behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeTool {
    /// Writes the requested netlist or parameter file and exits 0.
    Succeed,
    /// Exits with the given status without writing anything.
    Fail(i32),
    /// Exits 0 without writing anything.
    NoOutput,
}

/// Name of the log the fake tool appends each task to, in its working
/// directory.
pub const INVOCATION_LOG: &str = "invocations.log";

/// Writes an executable fake build tool into `dir` and returns its path.
///
/// The tool is called like `sbt "<task>"`. It parses `--netlist-name`,
/// `--netlist-directory` and `--python-file` out of the task.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, behavior: FakeTool) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let (name, body) = match behavior {
        FakeTool::Succeed => (
            "sbt-ok",
            r#"name=""; outdir=""; py=""
for tok in $1; do
  case "$tok" in
    --netlist-name=*) name="${tok#--netlist-name=}" ;;
    --netlist-directory=*) outdir="${tok#--netlist-directory=}" ;;
    --python-file=*) py="${tok#--python-file=}" ;;
  esac
done
case "$1" in
  *--xlen=64*) xlen=64 ;;
  *) xlen=32 ;;
esac
if [ -n "$py" ]; then
  printf 'VexiiRiscv.xlen = %s\nVexiiRiscv.with_rvc = False\nVexiiRiscv.isa = "rv%si"\n' "$xlen" "$xlen" > "$py"
fi
if [ -n "$name" ]; then
  printf 'module %s();\nendmodule\n' "$name" > "$outdir/$name.v"
fi
exit 0
"#
            .to_string(),
        ),
        FakeTool::Fail(code) => ("sbt-fail", format!("exit {code}\n")),
        FakeTool::NoOutput => ("sbt-silent", "exit 0\n".to_string()),
    };
    let path = dir.join(name);
    let script = format!("#!/bin/sh\necho \"$1\" >> {INVOCATION_LOG}\n{body}");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Number of times the fake tool ran with `checkout` as working directory.
pub fn invocation_count(checkout: &Path) -> usize {
    std::fs::read_to_string(checkout.join(INVOCATION_LOG))
        .map(|log| log.lines().count())
        .unwrap_or(0)
}

/// A test project laid out under a temporary directory.
pub struct TestProject {
    /// The project directory.
    pub dir: PathBuf,
    /// The VexRiscv checkout, created empty.
    pub vexriscv_dir: PathBuf,
    /// The VexiiRiscv checkout, created empty.
    pub vexiiriscv_dir: PathBuf,
}

impl TestProject {
    /// Creates the checkout directories under `dir`.
    pub fn new(dir: &Path) -> Self {
        let vexriscv_dir = dir.join("ext").join("VexRiscv");
        let vexiiriscv_dir = dir.join("ext").join("VexiiRiscv");
        std::fs::create_dir_all(&vexriscv_dir).unwrap();
        std::fs::create_dir_all(&vexiiriscv_dir).unwrap();
        Self {
            dir: dir.to_path_buf(),
            vexriscv_dir,
            vexiiriscv_dir,
        }
    }

    /// Parses a project for `board` and `cpu` built with `tool`; `extra` is
    /// appended verbatim.
    pub fn config(&self, board: &str, cpu: &str, tool: &Path, extra: &str) -> ProjectConfig {
        let text = format!(
            r#"
[project]
name = "conformance"

[soc]
board = "{board}"
cpu = "{cpu}"

[toolchain]
build_tool = "{tool}"

{extra}
"#,
            tool = tool.display(),
        );
        toml::from_str(&text).unwrap()
    }

    /// Resolves [`config`](Self::config) without overrides.
    pub fn resolve(&self, board: &str, cpu: &str, tool: &Path, extra: &str) -> ResolvedSoc {
        let config = self.config(board, cpu, tool, extra);
        resolve_soc(&config, &self.dir, &SocOverrides::default()).unwrap()
    }
}

/// The configuration `{cpu_count=1, l2_bytes=0, xlen=32}`, inserted out of
/// key order.
pub fn small_configuration() -> BuildConfiguration {
    let mut config = BuildConfiguration::new();
    config.insert("xlen", 32i64).unwrap();
    config.insert("cpu_count", 1i64).unwrap();
    config.insert("l2_bytes", 0i64).unwrap();
    config
}
