//! VexRiscv SMP clusters generated by `VexRiscvLitexSmpClusterCmdGen`.

use std::path::{Path, PathBuf};

use socgen_cache::PostProcess;
use socgen_common::Vendor;
use socgen_config::{parse_flag_args, BuildConfiguration};
use socgen_invoke::Checkout;

use crate::error::CpuError;
use crate::interface::{
    require_file, BusMaster, BusStandard, CpuCore, CpuInfo, CpuSettings, Generator,
    OutputConvention,
};
use crate::options::OptionReader;
use crate::region::MemoryRegion;

/// Registry name.
pub const NAME: &str = "vexriscv_smp";

/// Supported variants.
pub const VARIANTS: &[&str] = &[
    "standard",
    "linux",
    "standard+cfu",
    "linux+cfu",
    "standard+cxu",
    "linux+cxu",
];

/// Variant used when none is requested.
pub const DEFAULT_VARIANT: &str = "standard";

const ENTRY_POINT: &str = "vexriscv.demo.smp.VexRiscvLitexSmpClusterCmdGen";
const SYNTHESIS_DEFINE: &str = "`define SYNTHESIS\n";

/// Cluster options after defaults and overrides were applied.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SmpOptions {
    coherent_dma: bool,
    cpu_count: i64,
    ibus_width: u32,
    dbus_width: u32,
    dcache_size: i64,
    icache_size: i64,
    dcache_ways: i64,
    icache_ways: i64,
    litedram_width: u32,
    aes_instruction: bool,
    expose_time: bool,
    out_of_order_decoder: bool,
    privileged_debug: bool,
    hardware_breakpoints: i64,
    wishbone_memory: bool,
    wishbone_force_32b: bool,
    fpu: bool,
    cpu_per_fpu: i64,
    rvc: bool,
    itlb_size: i64,
    dtlb_size: i64,
    jtag_tap: bool,
}

impl SmpOptions {
    fn read(r: &mut OptionReader, variant: &str, l2_size: u64) -> Result<Self, CpuError> {
        let cpu_count = r.int("cpu_count", 1)?;
        let linux = variant.starts_with("linux");
        let smp = cpu_count > 1;
        let (cache_size, ways, width) = if smp {
            (8192, 2, 64)
        } else if linux {
            (8192, 2, 32)
        } else {
            (4096, 1, 32)
        };
        Ok(Self {
            coherent_dma: r.bool("coherent_dma", smp)?,
            cpu_count,
            ibus_width: r.width("ibus_width", width)?,
            dbus_width: r.width("dbus_width", width)?,
            dcache_size: r.int("dcache_size", cache_size)?,
            icache_size: r.int("icache_size", cache_size)?,
            dcache_ways: r.int("dcache_ways", ways)?,
            icache_ways: r.int("icache_ways", ways)?,
            litedram_width: r.width("litedram_width", 32)?,
            aes_instruction: r.bool("aes_instruction", false)?,
            expose_time: r.bool("expose_time", false)?,
            out_of_order_decoder: r.bool("out_of_order_decoder", true)?,
            privileged_debug: r.bool("privileged_debug", false)?,
            hardware_breakpoints: r.int("hardware_breakpoints", 0)?,
            wishbone_memory: r.bool("wishbone_memory", l2_size > 0)?,
            wishbone_force_32b: r.bool("wishbone_force_32b", false)?,
            fpu: r.bool("fpu", false)?,
            cpu_per_fpu: r.int("cpu_per_fpu", 4)?,
            rvc: r.bool("rvc", false)?,
            itlb_size: r.int("itlb_size", 4)?,
            dtlb_size: r.int("dtlb_size", 4)?,
            jtag_tap: r.bool("jtag_tap", false)?,
        })
    }

    fn insert_into(&self, cfg: &mut BuildConfiguration) -> Result<(), CpuError> {
        cfg.insert("coherent_dma", self.coherent_dma)?;
        cfg.insert("cpu_count", self.cpu_count)?;
        cfg.insert("ibus_width", self.ibus_width)?;
        cfg.insert("dbus_width", self.dbus_width)?;
        cfg.insert("dcache_size", self.dcache_size)?;
        cfg.insert("icache_size", self.icache_size)?;
        cfg.insert("dcache_ways", self.dcache_ways)?;
        cfg.insert("icache_ways", self.icache_ways)?;
        cfg.insert("litedram_width", self.litedram_width)?;
        cfg.insert("aes_instruction", self.aes_instruction)?;
        cfg.insert("expose_time", self.expose_time)?;
        cfg.insert("out_of_order_decoder", self.out_of_order_decoder)?;
        cfg.insert("privileged_debug", self.privileged_debug)?;
        cfg.insert("hardware_breakpoints", self.hardware_breakpoints)?;
        cfg.insert("wishbone_memory", self.wishbone_memory)?;
        cfg.insert("wishbone_force_32b", self.wishbone_force_32b)?;
        cfg.insert("fpu", self.fpu)?;
        if self.fpu {
            cfg.insert("cpu_per_fpu", self.cpu_per_fpu)?;
        }
        cfg.insert("rvc", self.rvc)?;
        cfg.insert("itlb_size", self.itlb_size)?;
        cfg.insert("dtlb_size", self.dtlb_size)?;
        cfg.insert("jtag_tap", self.jtag_tap)?;
        Ok(())
    }
}

/// A VexRiscv SMP cluster.
#[derive(Debug, Clone)]
pub struct VexRiscvSmp {
    info: CpuInfo,
    variant: String,
    options: SmpOptions,
    passthrough: BuildConfiguration,
    cfu: Option<PathBuf>,
    cxus: Vec<PathBuf>,
    reset_address: u64,
    checkout: Checkout,
}

impl VexRiscvSmp {
    /// Creates a cluster for `variant`, applying `settings` over its defaults.
    pub fn new(variant: &str, settings: &CpuSettings) -> Result<Self, CpuError> {
        if !VARIANTS.contains(&variant) {
            return Err(CpuError::UnknownVariant {
                cpu: NAME.to_string(),
                variant: variant.to_string(),
                available: VARIANTS.iter().map(|v| v.to_string()).collect(),
            });
        }
        let mut overrides = settings.options.clone();
        overrides.merge(&parse_flag_args(&settings.extra_args)?);
        let mut reader = OptionReader::new(&overrides);
        let options = SmpOptions::read(&mut reader, variant, settings.l2_size)?;
        let passthrough = reader.finish();

        let tc = &settings.toolchain;
        Ok(Self {
            info: CpuInfo {
                name: NAME,
                family: "riscv",
                category: "softcore",
                human_name: format!("VexRiscv SMP-{}", variant.to_uppercase()),
                gcc_triple: "riscv32-unknown-elf".to_string(),
                linker_output_format: "elf32-littleriscv".to_string(),
                nop: "nop",
            },
            variant: variant.to_string(),
            options,
            passthrough,
            cfu: settings.cfu.clone(),
            cxus: settings.cxus.clone(),
            reset_address: 0,
            checkout: Checkout {
                repo: tc.vexriscv_repo.clone(),
                branch: tc.vexriscv_branch.clone(),
                dir: tc.vexriscv_dir.clone(),
                auto_clone: tc.auto_clone,
            },
        })
    }

    fn with_cfu(&self) -> bool {
        self.variant.contains("cfu")
    }

    fn with_cxu(&self) -> bool {
        self.variant.contains("cxu")
    }

    fn isa(&self) -> String {
        let mut isa = "rv32ima".to_string();
        if self.options.fpu {
            isa.push_str("fd");
        }
        if self.options.rvc {
            isa.push('c');
        }
        isa
    }
}

impl CpuCore for VexRiscvSmp {
    fn info(&self) -> &CpuInfo {
        &self.info
    }

    fn variant(&self) -> &str {
        &self.variant
    }

    fn interrupts(&self) -> Vec<(String, u32)> {
        vec![("noirq".to_string(), 0)]
    }

    fn bus_masters(&self) -> Vec<BusMaster> {
        let mut masters = vec![BusMaster::new("pbus", BusStandard::Wishbone, 32)];
        if self.options.wishbone_memory {
            let width = if self.options.wishbone_force_32b {
                32
            } else {
                self.options.dbus_width
            };
            masters.push(BusMaster::new("mbus", BusStandard::Wishbone, width));
        }
        masters
    }

    fn memory_buses(&self) -> Vec<BusMaster> {
        if self.options.wishbone_memory {
            return Vec::new();
        }
        let width = self.options.litedram_width;
        vec![
            BusMaster::new("ibus", BusStandard::Native, width),
            BusMaster::new("dbus", BusStandard::Native, width),
        ]
    }

    fn reset_address(&self) -> u64 {
        self.reset_address
    }

    fn set_reset_address(&mut self, address: u64) {
        self.reset_address = address;
    }

    fn generator(&self) -> Generator {
        Generator {
            name: "VexRiscv SMP",
            cache_subdir: NAME,
            checkout: self.checkout.clone(),
            entry_point: ENTRY_POINT,
            extension: "v",
            output: OutputConvention::NetlistNameDir,
        }
    }

    fn required_sources(&self) -> Result<Vec<PathBuf>, CpuError> {
        let mut sources = Vec::new();
        if self.with_cfu() {
            let cfu = self.cfu.as_ref().ok_or_else(|| CpuError::MissingResource {
                path: PathBuf::new(),
                what: format!("CFU source for variant {} (set cpu.cfu)", self.variant),
            })?;
            require_file(cfu, "CFU source")?;
            sources.push(cfu.clone());
        }
        if self.with_cxu() {
            if self.cxus.is_empty() {
                return Err(CpuError::MissingResource {
                    path: PathBuf::new(),
                    what: format!("CXU sources for variant {} (set cpu.cxus)", self.variant),
                });
            }
            for cxu in &self.cxus {
                require_file(cxu, "CXU source")?;
                sources.push(cxu.clone());
            }
        }
        Ok(sources)
    }

    /// The cluster generator has a fixed memory map, so `regions` do not
    /// enter the configuration.
    fn build_configuration(
        &self,
        _regions: &[MemoryRegion],
    ) -> Result<BuildConfiguration, CpuError> {
        let mut cfg = BuildConfiguration::new();
        self.options.insert_into(&mut cfg)?;
        cfg.insert("with_cfu", self.with_cfu())?;
        cfg.insert("with_cxu", self.with_cxu())?;
        cfg.merge(&self.passthrough);
        Ok(cfg)
    }

    fn label(&self, _config: &BuildConfiguration) -> String {
        let o = &self.options;
        let mut label = format!(
            "VexRiscvLitexSmpCluster_Cc{}_Iw{}Is{}Iy{}_Dw{}Ds{}Dy{}_ITs{}DTs{}",
            o.cpu_count,
            o.ibus_width,
            o.icache_size,
            o.icache_ways,
            o.dbus_width,
            o.dcache_size,
            o.dcache_ways,
            o.itlb_size,
            o.dtlb_size,
        );
        if !o.wishbone_memory {
            label.push_str(&format!("_Ldw{}", o.litedram_width));
        }
        let suffixes = [
            (self.with_cfu(), "_Cfu".to_string()),
            (self.with_cxu(), "_Cxu".to_string()),
            (o.aes_instruction, "_Aes".to_string()),
            (o.out_of_order_decoder, "_Ood".to_string()),
            (o.wishbone_memory, "_Wm".to_string()),
            (o.wishbone_force_32b, "_Wf32".to_string()),
            (o.fpu, format!("_Fpu{}", o.cpu_per_fpu)),
            (o.privileged_debug, "_Pd".to_string()),
            (o.hardware_breakpoints > 0, format!("_Hb{}", o.hardware_breakpoints)),
            (o.rvc, "_Rvc".to_string()),
        ];
        for (set, suffix) in suffixes {
            if set {
                label.push_str(&suffix);
            }
        }
        label
    }

    fn post_process(&self) -> Option<PostProcess> {
        Some(add_synthesis_define)
    }

    fn toolchain_commands(&self, vendor: Vendor) -> Vec<String> {
        match vendor {
            Vendor::Intel => {
                vec![r#"set_global_assignment -name VERILOG_MACRO "SYNTHESIS=1""#.to_string()]
            }
            _ => Vec::new(),
        }
    }

    fn constants(&self) -> Vec<(String, String)> {
        let o = &self.options;
        vec![
            ("CPU_COUNT".to_string(), o.cpu_count.to_string()),
            ("CPU_ISA".to_string(), format!("\"{}\"", self.isa())),
            ("CPU_MMU".to_string(), "\"sv32\"".to_string()),
            ("CPU_DCACHE_SIZE".to_string(), o.dcache_size.to_string()),
            ("CPU_DCACHE_WAYS".to_string(), o.dcache_ways.to_string()),
            ("CPU_DCACHE_BLOCK_SIZE".to_string(), "64".to_string()),
            ("CPU_ICACHE_SIZE".to_string(), o.icache_size.to_string()),
            ("CPU_ICACHE_WAYS".to_string(), o.icache_ways.to_string()),
            ("CPU_ICACHE_BLOCK_SIZE".to_string(), "64".to_string()),
            ("CPU_DTLB_SIZE".to_string(), o.dtlb_size.to_string()),
            ("CPU_DTLB_WAYS".to_string(), o.dtlb_size.to_string()),
            ("CPU_ITLB_SIZE".to_string(), o.itlb_size.to_string()),
            ("CPU_ITLB_WAYS".to_string(), o.itlb_size.to_string()),
        ]
    }
}

/// Prepends `` `define SYNTHESIS`` unless the netlist already starts with it.
fn add_synthesis_define(path: &Path) -> std::io::Result<()> {
    let text = std::fs::read_to_string(path)?;
    if text.starts_with(SYNTHESIS_DEFINE) {
        return Ok(());
    }
    std::fs::write(path, format!("{SYNTHESIS_DEFINE}{text}"))
}
