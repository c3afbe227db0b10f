//! Cached generator runs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use socgen_cache::{FingerprintCache, PostProcess, Resolution};
use socgen_common::Fingerprint;
use socgen_config::{BuildConfiguration, ResolvedSoc};
use socgen_invoke::{git_checkout, render_args, CancelFlag, GeneratorCommand, InvokeOptions};

use crate::error::CpuError;
use crate::interface::{module_name, CpuCore, Generator};
use crate::region::MemoryRegion;

/// Cache subdirectory and artifact extension of every generator step.
pub const CACHE_LAYOUT: &[(&str, &str)] = &[
    ("vexriscv_smp", "v"),
    ("vexiiriscv", "v"),
    ("vexiiriscv-params", "py"),
];

/// A netlist available in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetlistReference {
    /// Fingerprint of the build configuration.
    pub fingerprint: Fingerprint,
    /// Path of the cached netlist.
    pub path: PathBuf,
    /// Top-level module the netlist defines.
    pub module_name: String,
    /// Whether the netlist was reused instead of generated.
    pub cache_hit: bool,
}

impl NetlistReference {
    fn new(resolution: Resolution, label: &str) -> Self {
        Self {
            module_name: module_name(label, &resolution.fingerprint),
            fingerprint: resolution.fingerprint,
            path: resolution.artifact_path,
            cache_hit: resolution.cache_hit,
        }
    }
}

/// Runs generator steps through the fingerprint cache.
#[derive(Debug, Clone)]
pub struct NetlistBuilder {
    cache_root: PathBuf,
    build_tool: String,
    force_rebuild: bool,
    lock_timeout: Duration,
    invoke: InvokeOptions,
}

impl NetlistBuilder {
    /// A builder caching under `cache_root` and running `sbt`.
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            build_tool: "sbt".to_string(),
            force_rebuild: false,
            lock_timeout: Duration::from_secs(3600),
            invoke: InvokeOptions::default(),
        }
    }

    /// A builder configured from a resolved project.
    pub fn from_resolved(soc: &ResolvedSoc) -> Self {
        let invoke = match soc.toolchain.timeout_secs {
            Some(secs) => InvokeOptions::with_timeout(Duration::from_secs(secs)),
            None => InvokeOptions::default(),
        };
        Self::new(&soc.cache.dir)
            .build_tool(&soc.toolchain.build_tool)
            .force_rebuild(soc.cache.no_netlist_cache)
            .lock_timeout(Duration::from_secs(soc.cache.lock_timeout_secs))
            .invoke_options(invoke)
    }

    /// Sets the build tool executable.
    pub fn build_tool(mut self, tool: &str) -> Self {
        self.build_tool = tool.to_string();
        self
    }

    /// Regenerates even when a cached artifact exists.
    pub fn force_rebuild(mut self, force: bool) -> Self {
        self.force_rebuild = force;
        self
    }

    /// Sets how long to wait for a concurrent build of the same netlist.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Sets the timeout and cancellation applied to generator processes.
    pub fn invoke_options(mut self, options: InvokeOptions) -> Self {
        self.invoke = options;
        self
    }

    /// Kills running generators once `flag` is set.
    pub fn cancel_on(mut self, flag: CancelFlag) -> Self {
        self.invoke.cancel = Some(flag);
        self
    }

    /// Root of all generator caches.
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// The cache holding artifacts of `generator`.
    pub fn cache_for(&self, generator: &Generator) -> FingerprintCache {
        self.cache(generator.cache_subdir, generator.extension)
    }

    /// Every generator cache, in [`CACHE_LAYOUT`] order.
    pub fn caches(&self) -> Vec<FingerprintCache> {
        CACHE_LAYOUT
            .iter()
            .map(|(subdir, ext)| self.cache(subdir, ext))
            .collect()
    }

    fn cache(&self, subdir: &str, ext: &str) -> FingerprintCache {
        FingerprintCache::new(self.cache_root.join(subdir), ext)
            .force_rebuild(self.force_rebuild)
            .lock_timeout(self.lock_timeout)
    }

    /// Looks `config` up without running anything.
    pub fn resolve(
        &self,
        generator: &Generator,
        config: &BuildConfiguration,
    ) -> Result<Resolution, CpuError> {
        Ok(self.cache_for(generator).resolve(config)?)
    }

    /// Returns the artifact for `config`, running `generator` on a miss.
    ///
    /// The checkout is cloned first when allowed. Generator failures are
    /// returned unchanged and leave nothing in the cache.
    pub fn run(
        &self,
        generator: &Generator,
        config: &BuildConfiguration,
        label: &str,
        post_process: Option<PostProcess>,
    ) -> Result<Resolution, CpuError> {
        let mut cache = self.cache_for(generator);
        if let Some(hook) = post_process {
            cache = cache.post_process(hook);
        }
        cache.build(config, label, |staging| -> Result<(), CpuError> {
            git_checkout(&generator.checkout, &self.invoke)?;
            let module = module_name(label, staging.fingerprint());
            let args = generator
                .output
                .command_line(staging, &module, render_args(config));
            GeneratorCommand::new(
                &self.build_tool,
                generator.entry_point,
                &generator.checkout.dir,
            )
            .args(args)
            .run(&self.invoke)?;
            staging.adopt(&generator.output.generated_path(staging, &module))?;
            Ok(())
        })
    }
}

/// Produces the netlist of `core` for the classified `regions`.
///
/// User sources are checked before anything runs. Cores with preparatory
/// steps must have been [prepared](CpuCore::prepare) by the caller.
pub fn configure(
    core: &dyn CpuCore,
    regions: &[MemoryRegion],
    builder: &NetlistBuilder,
) -> Result<NetlistReference, CpuError> {
    core.required_sources()?;
    let config = core.build_configuration(regions)?;
    let label = core.label(&config);
    let generator = core.generator();
    log::debug!("{} netlist options: {} entries", generator.name, config.len());
    let resolution = builder.run(&generator, &config, &label, core.post_process())?;
    log::info!(
        "{} netlist {}: {}",
        core.info().name,
        if resolution.cache_hit { "reused" } else { "generated" },
        resolution.artifact_path.display()
    );
    Ok(NetlistReference::new(resolution, &label))
}

#[cfg(all(test, unix))]
pub(crate) mod tests {
    use super::*;
    use crate::interface::OutputConvention;
    use socgen_invoke::{Checkout, ProcessError};
    use std::os::unix::fs::PermissionsExt;

    /// Writes an executable stand-in for `sbt` into `dir`.
    ///
    /// It records every task in `invocations.log` in its working directory
    /// and writes the artifact its output flags name. With `fail` set it
    /// exits 1 without writing anything.
    pub(crate) fn fake_build_tool(dir: &Path, fail: bool) -> PathBuf {
        let path = dir.join(if fail { "failing-sbt" } else { "fake-sbt" });
        let body = if fail {
            "#!/bin/sh\necho \"$1\" >> invocations.log\nexit 1\n".to_string()
        } else {
            r#"#!/bin/sh
echo "$1" >> invocations.log
name=""; outdir=""; py=""
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
  printf 'VexiiRiscv.xlen = %s\nVexiiRiscv.with_rvc = False\n' "$xlen" > "$py"
fi
if [ -n "$name" ]; then
  printf 'module %s();\nendmodule\n' "$name" > "$outdir/$name.v"
fi
exit 0
"#
            .to_string()
        };
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn generator(checkout: PathBuf) -> Generator {
        Generator {
            name: "test",
            cache_subdir: "vexiiriscv",
            checkout: Checkout {
                repo: "https://example.invalid/gen.git".to_string(),
                branch: "dev".to_string(),
                dir: checkout,
                auto_clone: false,
            },
            entry_point: "gen.Main",
            extension: "v",
            output: OutputConvention::NetlistNameDir,
        }
    }

    fn config() -> BuildConfiguration {
        let mut cfg = BuildConfiguration::new();
        cfg.insert("cpu_count", 1i64).unwrap();
        cfg.insert("with_dma", true).unwrap();
        cfg
    }

    fn setup(fail: bool) -> (tempfile::TempDir, NetlistBuilder, Generator) {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_build_tool(dir.path(), fail);
        let checkout = dir.path().join("checkout");
        std::fs::create_dir(&checkout).unwrap();
        let builder =
            NetlistBuilder::new(dir.path().join("cache")).build_tool(&tool.to_string_lossy());
        (dir, builder, generator(checkout))
    }

    fn invocations(generator: &Generator) -> Vec<String> {
        std::fs::read_to_string(generator.checkout.dir.join("invocations.log"))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    #[test]
    fn miss_runs_generator_then_hits() {
        let (_dir, builder, gen) = setup(false);
        let first = builder.run(&gen, &config(), "test", None).unwrap();
        assert!(!first.cache_hit);
        assert!(first.artifact_path.is_file());

        let second = builder.run(&gen, &config(), "test", None).unwrap();
        assert!(second.cache_hit);
        assert_eq!(second.fingerprint, first.fingerprint);
        assert_eq!(invocations(&gen).len(), 1);
    }

    #[test]
    fn output_flags_lead_the_task() {
        let (_dir, builder, gen) = setup(false);
        let r = builder.run(&gen, &config(), "test", None).unwrap();
        let task = &invocations(&gen)[0];
        let prefix = format!(
            "runMain gen.Main --netlist-name={} --netlist-directory=",
            module_name("test", &r.fingerprint)
        );
        assert!(task.starts_with(&prefix), "{task}");
        assert!(task.ends_with("--cpu-count=1 --with-dma"), "{task}");
    }

    #[test]
    fn generated_module_is_stored_under_fingerprint() {
        let (_dir, builder, gen) = setup(false);
        let r = builder.run(&gen, &config(), "test", None).unwrap();
        assert_eq!(
            r.artifact_path.file_name().unwrap().to_string_lossy(),
            format!("{}.v", r.fingerprint)
        );
        let body = std::fs::read_to_string(&r.artifact_path).unwrap();
        let module = module_name("test", &r.fingerprint);
        assert!(body.starts_with(&format!("module {module}(")), "{body}");
        assert!(!module.starts_with(|c: char| c.is_ascii_digit()));
    }

    #[test]
    fn cancelled_generator_leaves_no_entry() {
        let (_dir, builder, gen) = setup(false);
        let flag = CancelFlag::new();
        flag.cancel();
        let builder = builder.cancel_on(flag);
        let err = builder.run(&gen, &config(), "test", None).unwrap_err();
        assert!(matches!(err, CpuError::Process(ProcessError::Cancelled { .. })));
        assert!(builder.cache_for(&gen).entries().unwrap().is_empty());
    }

    #[test]
    fn generator_failure_leaves_no_entry() {
        let (_dir, builder, gen) = setup(true);
        let err = builder.run(&gen, &config(), "test", None).unwrap_err();
        assert!(matches!(err, CpuError::Process(ProcessError::Exit { code: 1, .. })));
        assert!(builder.cache_for(&gen).entries().unwrap().is_empty());
        assert!(!builder.resolve(&gen, &config()).unwrap().cache_hit);
    }

    #[test]
    fn force_rebuild_reruns() {
        let (_dir, builder, gen) = setup(false);
        builder.run(&gen, &config(), "test", None).unwrap();
        let builder = builder.force_rebuild(true);
        let again = builder.run(&gen, &config(), "test", None).unwrap();
        assert!(!again.cache_hit);
        assert_eq!(invocations(&gen).len(), 2);
    }

    #[test]
    fn missing_checkout_without_clone_fails_before_running() {
        let (dir, builder, mut gen) = setup(false);
        gen.checkout.dir = dir.path().join("absent");
        let err = builder.run(&gen, &config(), "test", None).unwrap_err();
        assert!(matches!(
            err,
            CpuError::Process(ProcessError::MissingResource { .. })
        ));
    }

    #[test]
    fn caches_follow_layout() {
        let builder = NetlistBuilder::new("/c");
        let dirs: Vec<PathBuf> = builder.caches().iter().map(|c| c.dir().to_path_buf()).collect();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/c/vexriscv_smp"),
                PathBuf::from("/c/vexiiriscv"),
                PathBuf::from("/c/vexiiriscv-params"),
            ]
        );
    }
}
