//! VexiiRiscv, built in two cached steps.
//!
//! `PythonArgsGen` first turns the core arguments into a parameter file the
//! SoC needs before it can be laid out (notably `xlen`). `SocGen` then
//! produces the netlist from the same core arguments plus the SoC-level
//! options and memory regions.

use socgen_common::Vendor;
use socgen_config::{parse_flag_args, BuildConfiguration, OptionValue};
use socgen_invoke::Checkout;

use crate::error::CpuError;
use crate::interface::{
    ram_model, BusMaster, BusStandard, CpuCore, CpuInfo, CpuSettings, Generator,
    OutputConvention,
};
use crate::netlist::NetlistBuilder;
use crate::options::OptionReader;
use crate::params_file::GeneratedParams;
use crate::region::{regions_to_option, AccessMode, BusRegion, MemoryRegion};

/// Registry name.
pub const NAME: &str = "vexiiriscv";

/// Supported variants.
pub const VARIANTS: &[&str] = &["standard", "linux", "debian"];

/// Variant used when none is requested.
pub const DEFAULT_VARIANT: &str = "linux";

const PARAMS_ENTRY_POINT: &str = "vexiiriscv.soc.litex.PythonArgsGen";
const NETLIST_ENTRY_POINT: &str = "vexiiriscv.soc.litex.SocGen";
const PARAMS_CACHE: &str = "vexiiriscv-params";
const LUTRAM_MODEL: &str = "Ram_1w_1ra_Generic.v";

const BASE_ARGS: &str = "--with-mul --with-div --allow-bypass-from=0 --performance-counters=0 \
    --fetch-l1 --fetch-l1-ways=2 --lsu-l1 --lsu-l1-ways=2 --with-lsu-bypass --relaxed-branch";
const SUPERVISOR_ARGS: &str = "--with-rva --with-supervisor \
    --fetch-l1-ways=4 --fetch-l1-mem-data-width-min=64 \
    --lsu-l1-ways=4 --lsu-l1-mem-data-width-min=64";
const DEBIAN_ARGS: &str = "--xlen=64 --with-rvc --with-rvf --with-rvd \
    --fma-reduced-accuracy --fpu-ignore-subnormal";
const PREDICTOR_ARGS: &str = "--with-btb --with-ras --with-gshare";

/// OpenSBI reservation at the top of the first 16 MiB of main RAM.
const OPENSBI_OFFSET: u64 = 0x00f0_0000;
const OPENSBI_SIZE: u64 = 0x8_0000;

/// SoC-level generator options.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SocOptions {
    cpu_count: i64,
    l2_bytes: i64,
    with_cpu_clk: bool,
    l2_ways: i64,
    l2_self_flush: Option<i64>,
    litedram_width: u32,
    with_jtag_tap: bool,
    with_jtag_instruction: bool,
    with_dma: bool,
    with_axi3: bool,
    video: Vec<String>,
    mac_sg: Vec<String>,
    with_opensbi: bool,
}

impl SocOptions {
    fn read(r: &mut OptionReader, supervisor: bool) -> Result<Self, CpuError> {
        Ok(Self {
            cpu_count: r.int("cpu_count", 1)?,
            l2_bytes: r.int("l2_bytes", 0)?,
            with_cpu_clk: r.bool("with_cpu_clk", false)?,
            l2_ways: r.int("l2_ways", 4)?,
            l2_self_flush: r.opt_int("l2_self_flush")?,
            litedram_width: r.width("litedram_width", 32)?,
            with_jtag_tap: r.bool("with_jtag_tap", false)?,
            with_jtag_instruction: r.bool("with_jtag_instruction", false)?,
            with_dma: r.bool("with_dma", false)?,
            with_axi3: r.bool("with_axi3", false)?,
            video: r.strings("video")?,
            mac_sg: r.strings("mac_sg")?,
            with_opensbi: r.bool("with_opensbi", supervisor)?,
        })
    }
}

/// A VexiiRiscv core or cluster.
#[derive(Debug, Clone)]
pub struct VexiiRiscv {
    info: CpuInfo,
    variant: String,
    core_args: BuildConfiguration,
    soc: SocOptions,
    passthrough: BuildConfiguration,
    l2_size: u64,
    params: Option<GeneratedParams>,
    reset_address: u64,
    checkout: Checkout,
}

impl VexiiRiscv {
    /// Creates a core for `variant`, applying `settings` over its defaults.
    pub fn new(variant: &str, settings: &CpuSettings) -> Result<Self, CpuError> {
        if !VARIANTS.contains(&variant) {
            return Err(CpuError::UnknownVariant {
                cpu: NAME.to_string(),
                variant: variant.to_string(),
                available: VARIANTS.iter().map(|v| v.to_string()).collect(),
            });
        }
        let supervisor = matches!(variant, "linux" | "debian");
        let mut args = BASE_ARGS.to_string();
        if supervisor {
            args.push(' ');
            args.push_str(SUPERVISOR_ARGS);
        }
        if variant == "debian" {
            args.push(' ');
            args.push_str(DEBIAN_ARGS);
        }
        if supervisor {
            args.push(' ');
            args.push_str(PREDICTOR_ARGS);
        }
        args.push(' ');
        args.push_str(&settings.extra_args);
        let core_args = parse_flag_args(&args)?;
        log::debug!("vexiiriscv core arguments: {}", args.trim_end());

        let mut reader = OptionReader::new(&settings.options);
        let soc = SocOptions::read(&mut reader, supervisor)?;
        let passthrough = reader.finish();

        let xlen = core_args.get("xlen").and_then(OptionValue::as_int).unwrap_or(32);
        let tc = &settings.toolchain;
        let mut cpu = Self {
            info: CpuInfo {
                name: NAME,
                family: "riscv",
                category: "softcore",
                human_name: "VexiiRiscv".to_string(),
                gcc_triple: String::new(),
                linker_output_format: String::new(),
                nop: "nop",
            },
            variant: variant.to_string(),
            core_args,
            soc,
            passthrough,
            l2_size: settings.l2_size,
            params: None,
            reset_address: 0,
            checkout: Checkout {
                repo: tc.vexiiriscv_repo.clone(),
                branch: tc.vexiiriscv_branch.clone(),
                dir: tc.vexiiriscv_dir.clone(),
                auto_clone: tc.auto_clone,
            },
        };
        cpu.set_xlen(xlen);
        Ok(cpu)
    }

    /// Register width: from the parameter file once prepared, otherwise
    /// from the core arguments.
    pub fn xlen(&self) -> i64 {
        self.params
            .as_ref()
            .and_then(|p| p.int("xlen"))
            .or_else(|| self.core_args.get("xlen").and_then(OptionValue::as_int))
            .unwrap_or(32)
    }

    /// The arguments describing the core itself.
    pub fn core_args(&self) -> &BuildConfiguration {
        &self.core_args
    }

    /// Parameters read by [`prepare`](CpuCore::prepare), if it ran.
    pub fn params(&self) -> Option<&GeneratedParams> {
        self.params.as_ref()
    }

    /// The parameter generation step.
    pub fn params_generator(&self) -> Generator {
        Generator {
            name: "VexiiRiscv parameters",
            cache_subdir: PARAMS_CACHE,
            checkout: self.checkout.clone(),
            entry_point: PARAMS_ENTRY_POINT,
            extension: "py",
            output: OutputConvention::PythonFile,
        }
    }

    fn set_xlen(&mut self, xlen: i64) {
        self.info.gcc_triple = format!("riscv{xlen}-unknown-elf");
        self.info.linker_output_format = format!("elf{xlen}-littleriscv");
    }

    fn isa(&self) -> String {
        let mut isa = format!("rv{}im", self.xlen());
        for (flag, ext) in [
            ("with_rva", 'a'),
            ("with_rvf", 'f'),
            ("with_rvd", 'd'),
            ("with_rvc", 'c'),
        ] {
            if self.core_args.flag(flag) {
                isa.push(ext);
            }
        }
        isa
    }
}

impl CpuCore for VexiiRiscv {
    fn info(&self) -> &CpuInfo {
        &self.info
    }

    fn variant(&self) -> &str {
        &self.variant
    }

    fn linker_regions(&self) -> Vec<BusRegion> {
        if !self.soc.with_opensbi {
            return Vec::new();
        }
        let main_ram = self
            .memory_map()
            .into_iter()
            .find(|(name, _)| name == "main_ram")
            .map(|(_, base)| base)
            .unwrap_or(0x4000_0000);
        vec![BusRegion::linker(
            "opensbi",
            main_ram + OPENSBI_OFFSET,
            OPENSBI_SIZE,
            AccessMode::RWX,
        )]
    }

    fn bus_masters(&self) -> Vec<BusMaster> {
        vec![BusMaster::new("pbus", BusStandard::AxiLite, 32)]
    }

    fn memory_buses(&self) -> Vec<BusMaster> {
        if self.l2_size > 0 {
            return Vec::new();
        }
        vec![BusMaster::new(
            "mbus",
            BusStandard::Axi,
            self.soc.litedram_width,
        )]
    }

    fn reset_address(&self) -> u64 {
        self.reset_address
    }

    fn set_reset_address(&mut self, address: u64) {
        self.reset_address = address;
    }

    fn generator(&self) -> Generator {
        Generator {
            name: "VexiiRiscv",
            cache_subdir: NAME,
            checkout: self.checkout.clone(),
            entry_point: NETLIST_ENTRY_POINT,
            extension: "v",
            output: OutputConvention::NetlistNameDir,
        }
    }

    /// Generates (or reuses) the parameter file and adopts its `xlen`.
    fn prepare(&mut self, builder: &NetlistBuilder) -> Result<(), CpuError> {
        let generator = self.params_generator();
        let label = format!("VexiiRiscvParams_{}", self.variant);
        let resolution = builder.run(&generator, &self.core_args, &label, None)?;
        let params = GeneratedParams::load(&resolution.artifact_path)?;
        if let Some(xlen) = params.int("xlen") {
            if xlen != 32 && xlen != 64 {
                return Err(CpuError::ParamsFile {
                    path: resolution.artifact_path,
                    line: 0,
                    reason: format!("unsupported xlen {xlen}"),
                });
            }
            self.set_xlen(xlen);
        }
        log::debug!("vexiiriscv parameters: {} attributes", params.len());
        self.params = Some(params);
        Ok(())
    }

    fn build_configuration(
        &self,
        regions: &[MemoryRegion],
    ) -> Result<BuildConfiguration, CpuError> {
        let s = &self.soc;
        let mut cfg = self.core_args.clone();
        cfg.insert("cpu_count", s.cpu_count)?;
        cfg.insert("l2_bytes", s.l2_bytes)?;
        cfg.insert("with_cpu_clk", s.with_cpu_clk)?;
        cfg.insert("l2_ways", s.l2_ways)?;
        if let Some(flush) = s.l2_self_flush {
            cfg.insert("l2_self_flush", flush)?;
        }
        cfg.insert("litedram_width", s.litedram_width)?;
        cfg.insert("memory_region", regions_to_option(regions)?)?;
        cfg.insert("with_jtag_tap", s.with_jtag_tap)?;
        cfg.insert("with_jtag_instruction", s.with_jtag_instruction)?;
        cfg.insert("with_dma", s.with_dma)?;
        cfg.insert("with_axi3", s.with_axi3)?;
        cfg.insert("video", OptionValue::Strings(s.video.clone()))?;
        cfg.insert("mac_sg", OptionValue::Strings(s.mac_sg.clone()))?;
        cfg.merge(&self.passthrough);
        Ok(cfg)
    }

    fn label(&self, config: &BuildConfiguration) -> String {
        let int = |key: &str| config.get(key).and_then(OptionValue::as_int).unwrap_or(0);
        let mut label = format!(
            "VexiiRiscvLitex_{}_Xl{}_Cc{}",
            self.variant,
            self.xlen(),
            int("cpu_count")
        );
        if int("l2_bytes") > 0 {
            label.push_str(&format!("_L2b{}w{}", int("l2_bytes"), int("l2_ways")));
        }
        if config.flag("with_dma") {
            label.push_str("_Dma");
        }
        label
    }

    fn ram_models(&self, vendor: Vendor) -> Vec<&'static str> {
        vec![ram_model(vendor), LUTRAM_MODEL]
    }

    fn constants(&self) -> Vec<(String, String)> {
        let mut constants = vec![
            ("CPU_COUNT".to_string(), self.soc.cpu_count.to_string()),
            ("CPU_ISA".to_string(), format!("\"{}\"", self.isa())),
            ("CPU_XLEN".to_string(), self.xlen().to_string()),
        ];
        if self.core_args.flag("with_supervisor") {
            let mmu = if self.xlen() == 64 { "sv39" } else { "sv32" };
            constants.push(("CPU_MMU".to_string(), format!("\"{mmu}\"")));
        }
        if self.soc.l2_bytes > 0 {
            constants.push(("CPU_L2_BYTES".to_string(), self.soc.l2_bytes.to_string()));
        }
        constants
    }
}
