//! The CPU core interface consumed by the SoC builder.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use socgen_cache::{PostProcess, Staging};
use socgen_common::{Fingerprint, Vendor};
use socgen_config::{BuildConfiguration, ResolvedSoc, ToolchainConfig};
use socgen_invoke::Checkout;

use crate::error::CpuError;
use crate::netlist::NetlistBuilder;
use crate::region::{BusRegion, MemoryRegion};

/// Bus protocol of a CPU master interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BusStandard {
    /// Wishbone B4.
    Wishbone,
    /// AXI4.
    Axi,
    /// AXI4-Lite.
    AxiLite,
    /// The generator's native memory port, bridged by the SoC.
    Native,
}

impl fmt::Display for BusStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BusStandard::Wishbone => "wishbone",
            BusStandard::Axi => "axi",
            BusStandard::AxiLite => "axi-lite",
            BusStandard::Native => "native",
        })
    }
}

/// A bus master interface exposed by the CPU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusMaster {
    /// Interface name (`ibus`, `dbus`, `mbus`, `dma`, ...).
    pub name: String,
    /// Protocol.
    pub standard: BusStandard,
    /// Data width in bits.
    pub data_width: u32,
    /// Address width in bits.
    pub address_width: u32,
}

impl BusMaster {
    /// A master with a 32-bit address space.
    pub fn new(name: &str, standard: BusStandard, data_width: u32) -> Self {
        Self {
            name: name.to_string(),
            standard,
            data_width,
            address_width: 32,
        }
    }
}

/// Static identity of a CPU, as exported to firmware builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuInfo {
    /// Registry name (`vexriscv_smp`, `vexiiriscv`).
    pub name: &'static str,
    /// ISA family.
    pub family: &'static str,
    /// `softcore` for every supported CPU.
    pub category: &'static str,
    /// Display name.
    pub human_name: String,
    /// Target triple of the firmware toolchain.
    pub gcc_triple: String,
    /// Linker output format.
    pub linker_output_format: String,
    /// The no-op instruction mnemonic.
    pub nop: &'static str,
}

/// Top-level module name of the netlist `fingerprint` built under `label`.
///
/// Always a legal Verilog identifier: characters outside `[A-Za-z0-9_]`
/// become `_`, a leading digit gets an `N` prefix, and the first eight
/// fingerprint digits are appended so configurations sharing a label stay
/// distinct.
pub fn module_name(label: &str, fingerprint: &Fingerprint) -> String {
    let mut name: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        name.insert(0, 'N');
    }
    let short: String = fingerprint.to_hex().chars().take(8).collect();
    format!("{name}_{short}")
}

/// How a generator is told where to write its artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputConvention {
    /// `--netlist-name=<module> --netlist-directory=<dir>`; the generator
    /// writes `<dir>/<module>.<ext>`.
    NetlistNameDir,
    /// `--python-file=<path>`.
    PythonFile,
}

impl OutputConvention {
    /// Output arguments pointing the generator at `staging`, naming the
    /// netlist's top module `module`.
    ///
    /// These only reach the command line. They never enter the build
    /// configuration, so they do not affect fingerprints.
    pub fn args(&self, staging: &Staging, module: &str) -> Vec<String> {
        match self {
            OutputConvention::NetlistNameDir => vec![
                format!("--netlist-name={module}"),
                format!("--netlist-directory={}", staging.dir().display()),
            ],
            OutputConvention::PythonFile => vec![format!(
                "--python-file={}",
                staging.artifact_path().display()
            )],
        }
    }

    /// The full generator argument list: netlist outputs lead, the Python
    /// file trails.
    pub fn command_line(&self, staging: &Staging, module: &str, args: Vec<String>) -> Vec<String> {
        let output = self.args(staging, module);
        match self {
            OutputConvention::NetlistNameDir => output.into_iter().chain(args).collect(),
            OutputConvention::PythonFile => args.into_iter().chain(output).collect(),
        }
    }

    /// Where the generator writes its output inside `staging`.
    pub fn generated_path(&self, staging: &Staging, module: &str) -> PathBuf {
        match self {
            OutputConvention::NetlistNameDir => {
                let ext = staging
                    .artifact_path()
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("v");
                staging.dir().join(format!("{module}.{ext}"))
            }
            OutputConvention::PythonFile => staging.artifact_path().to_path_buf(),
        }
    }
}

/// One external generator step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    /// Short name used in logs.
    pub name: &'static str,
    /// Cache subdirectory; every generator family keeps its own.
    pub cache_subdir: &'static str,
    /// Source checkout the build tool runs in.
    pub checkout: Checkout,
    /// Main class run through the build tool.
    pub entry_point: &'static str,
    /// Artifact file extension.
    pub extension: &'static str,
    /// Output argument convention.
    pub output: OutputConvention,
}

/// Inputs shared by every CPU implementation.
#[derive(Debug, Clone, Default)]
pub struct CpuSettings {
    /// Option overrides from `[cpu]`; they win over CPU defaults.
    pub options: BuildConfiguration,
    /// Raw generator flags, applied last.
    pub extra_args: String,
    /// Custom function unit source.
    pub cfu: Option<PathBuf>,
    /// Custom extension unit sources.
    pub cxus: Vec<PathBuf>,
    /// L2 cache size requested by the SoC, in bytes.
    pub l2_size: u64,
    /// Generator checkouts and build tool.
    pub toolchain: ToolchainConfig,
}

impl CpuSettings {
    /// Settings taken from a resolved project.
    pub fn from_resolved(soc: &ResolvedSoc, l2_size: u64) -> Self {
        Self {
            options: soc.cpu_options.clone(),
            extra_args: soc.extra_args.clone(),
            cfu: soc.cfu.clone(),
            cxus: soc.cxus.clone(),
            l2_size,
            toolchain: soc.toolchain.clone(),
        }
    }
}

/// A soft CPU whose netlist comes from an external generator.
///
/// The SoC builder only talks to CPUs through this trait. Implementations
/// own their option defaults; [`build_configuration`] returns everything
/// that affects the generated netlist, keyed by option name.
///
/// [`build_configuration`]: CpuCore::build_configuration
pub trait CpuCore: fmt::Debug + Send {
    /// Static identity.
    fn info(&self) -> &CpuInfo;

    /// Selected variant.
    fn variant(&self) -> &str;

    /// Region name to base address, in declaration order.
    fn memory_map(&self) -> Vec<(String, u64)> {
        vec![
            ("rom".to_string(), 0x0000_0000),
            ("sram".to_string(), 0x1000_0000),
            ("main_ram".to_string(), 0x4000_0000),
            ("csr".to_string(), 0xf000_0000),
            ("clint".to_string(), 0xf001_0000),
            ("plic".to_string(), 0xf0c0_0000),
        ]
    }

    /// Uncached IO windows as `(origin, size)`.
    fn io_regions(&self) -> Vec<(u64, u64)> {
        vec![(0x8000_0000, 0x8000_0000)]
    }

    /// Interrupt name to line number.
    fn interrupts(&self) -> Vec<(String, u32)> {
        Vec::new()
    }

    /// Linker-only regions the firmware needs, such as space reserved for
    /// OpenSBI inside main RAM.
    fn linker_regions(&self) -> Vec<BusRegion> {
        Vec::new()
    }

    /// Masters attached to the SoC's peripheral bus.
    fn bus_masters(&self) -> Vec<BusMaster>;

    /// Masters attached directly to the main memory controller.
    fn memory_buses(&self) -> Vec<BusMaster>;

    /// Address the CPU starts executing from.
    fn reset_address(&self) -> u64;

    /// Moves the reset vector.
    fn set_reset_address(&mut self, address: u64);

    /// The netlist generator.
    fn generator(&self) -> Generator;

    /// Runs generator steps the core needs before its configuration is
    /// known. Most cores need none.
    fn prepare(&mut self, _builder: &NetlistBuilder) -> Result<(), CpuError> {
        Ok(())
    }

    /// Checks that every user-provided source exists.
    fn required_sources(&self) -> Result<Vec<PathBuf>, CpuError> {
        Ok(Vec::new())
    }

    /// The options passed to the netlist generator, given the classified
    /// SoC regions.
    fn build_configuration(
        &self,
        regions: &[MemoryRegion],
    ) -> Result<BuildConfiguration, CpuError>;

    /// A readable name for the configuration, used in logs and cache entries.
    fn label(&self, config: &BuildConfiguration) -> String;

    /// Rewrites the staged netlist before it enters the cache.
    fn post_process(&self) -> Option<PostProcess> {
        None
    }

    /// Block RAM models synthesized next to the netlist, for `vendor`.
    fn ram_models(&self, vendor: Vendor) -> Vec<&'static str> {
        vec![ram_model(vendor)]
    }

    /// Extra commands for the vendor toolchain.
    fn toolchain_commands(&self, _vendor: Vendor) -> Vec<String> {
        Vec::new()
    }

    /// Constants exported to firmware, in addition to `CPU_TYPE` and friends.
    fn constants(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// The synchronous-read RAM model matching `vendor`.
pub(crate) fn ram_model(vendor: Vendor) -> &'static str {
    match vendor {
        Vendor::Intel => "Ram_1w_1rs_Intel.v",
        Vendor::Efinix => "Ram_1w_1rs_Efinix.v",
        _ => "Ram_1w_1rs_Generic.v",
    }
}

/// Verifies `path` exists, naming it `what` otherwise.
pub(crate) fn require_file(path: &Path, what: &str) -> Result<(), CpuError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CpuError::MissingResource {
            path: path.to_path_buf(),
            what: what.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_verilog_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    }

    #[test]
    fn module_names_are_verilog_identifiers() {
        for n in 0..16u8 {
            let fp = Fingerprint::of(&[n]);
            for label in ["VexRiscvLitexSmpCluster_Cc1", "VexiiRiscvLitex_linux+cfu_Xl64", "4way"] {
                let name = module_name(label, &fp);
                assert!(is_verilog_identifier(&name), "{name}");
            }
        }
    }

    #[test]
    fn module_name_keeps_label_and_fingerprint_prefix() {
        let fp = Fingerprint::of(b"cpu_count=1");
        let name = module_name("VexRiscvLitexSmpCluster_Cc1", &fp);
        let hex = fp.to_hex();
        assert_eq!(name, format!("VexRiscvLitexSmpCluster_Cc1_{}", &hex[..8]));
        assert_eq!(module_name("2cores", &fp), format!("N2cores_{}", &hex[..8]));
    }

    #[test]
    fn ram_model_per_vendor() {
        assert_eq!(ram_model(Vendor::Intel), "Ram_1w_1rs_Intel.v");
        assert_eq!(ram_model(Vendor::Efinix), "Ram_1w_1rs_Efinix.v");
        assert_eq!(ram_model(Vendor::Xilinx), "Ram_1w_1rs_Generic.v");
        assert_eq!(ram_model(Vendor::Gowin), "Ram_1w_1rs_Generic.v");
    }

    #[test]
    fn bus_master_defaults_to_32_bit_addresses() {
        let m = BusMaster::new("mbus", BusStandard::Axi, 128);
        assert_eq!(m.address_width, 32);
        assert_eq!(m.data_width, 128);
        assert_eq!(m.standard.to_string(), "axi");
    }

    #[test]
    fn require_file_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfu.v");
        let err = require_file(&path, "CFU source").unwrap_err();
        assert!(err.to_string().contains("CFU source"));
        std::fs::write(&path, "module cfu; endmodule\n").unwrap();
        require_file(&path, "CFU source").unwrap();
    }
}
