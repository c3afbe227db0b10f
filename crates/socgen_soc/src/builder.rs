//! SoC assembly for a board and CPU.
//!
//! [`SocBuilder::new`] resolves and validates every parameter before
//! anything is assembled. [`SocBuilder::describe`] records the SoC through a
//! [`SocAssembler`] and classifies its regions; [`SocBuilder::build`] then
//! hands the classified regions to the CPU and produces its netlist.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use socgen_config::{BuildConfiguration, ConfigError, ResolvedSoc};
use socgen_cpu::{
    classify, configure, synthesis_sources, AccessMode, BusRegion, CpuCore, CpuRegistry,
    CpuSettings, MemoryRegion, NetlistBuilder, NetlistReference, SynthesisSources, NO_CPU,
};

use crate::assembler::{SocAssembler, SocDescription};
use crate::error::SocError;
use crate::params::{ParamValue, SocParams};
use crate::registry::{has_capability, CapabilityDescriptor};

/// The SoC memory map before any CPU override.
pub const BASE_MEMORY_MAP: &[(&str, u64)] = &[
    ("rom", 0x0000_0000),
    ("sram", 0x0100_0000),
    ("main_ram", 0x4000_0000),
    ("csr", 0xf000_0000),
];

/// Size of the CSR window.
pub const CSR_REGION_SIZE: u64 = 0x1_0000;

/// The result of a full build.
#[derive(Debug, Clone, Serialize)]
pub struct SocBuild {
    /// The assembled SoC.
    pub description: SocDescription,
    /// The regions handed to the CPU generator.
    pub regions: Vec<MemoryRegion>,
    /// The CPU netlist; `None` without a CPU.
    pub netlist: Option<NetlistReference>,
    /// Synthesis inputs of the CPU; empty without a CPU.
    pub sources: SynthesisSources,
}

/// Assembles one SoC.
#[derive(Debug)]
pub struct SocBuilder<'a> {
    board: &'a CapabilityDescriptor,
    params: SocParams,
    features: Vec<String>,
    support_dir: PathBuf,
    cpu: Option<Box<dyn CpuCore>>,
}

impl<'a> SocBuilder<'a> {
    /// Resolves the parameters of `soc` on `board`, validates them and
    /// selects the CPU.
    pub fn new(board: &'a CapabilityDescriptor, soc: &ResolvedSoc) -> Result<Self, SocError> {
        let mut params = SocParams::resolve(board, soc)?;
        validate(&mut params)?;
        check_features(board, &soc.features)?;

        let settings = CpuSettings::from_resolved(soc, params.l2_size);
        let cpu = CpuRegistry::builtin().create(
            &params.cpu_type,
            params.cpu_variant.as_deref(),
            &settings,
        )?;
        Ok(Self {
            board,
            params,
            features: soc.features.clone(),
            support_dir: soc.toolchain.support_dir.clone(),
            cpu,
        })
    }

    /// The board being built for.
    pub fn board(&self) -> &CapabilityDescriptor {
        self.board
    }

    /// The resolved parameters.
    pub fn params(&self) -> &SocParams {
        &self.params
    }

    /// The selected CPU, if any.
    pub fn cpu(&self) -> Option<&dyn CpuCore> {
        self.cpu.as_deref()
    }

    /// Assembles the SoC into `soc`.
    pub fn assemble(&mut self, soc: &mut dyn SocAssembler) -> Result<(), SocError> {
        let p = &self.params;
        let mut map: Vec<(String, u64)> = BASE_MEMORY_MAP
            .iter()
            .map(|(name, base)| (name.to_string(), *base))
            .collect();
        let mut irqs = IrqAllocator::default();

        if p.with_ctrl {
            soc.add_peripheral("ctrl", BTreeMap::new());
        }

        if let Some(cpu) = self.cpu.as_mut() {
            for (n, (origin, size)) in cpu.io_regions().into_iter().enumerate() {
                soc.add_io_region(&format!("io{n}"), origin, size);
            }
            for (name, base) in cpu.memory_map() {
                match map.iter_mut().find(|(n, _)| *n == name) {
                    Some(entry) if entry.1 != base => {
                        log::info!(
                            "CPU overriding {name} mapping from 0x{:08x} to 0x{base:08x}",
                            entry.1
                        );
                        entry.1 = base;
                    }
                    Some(_) => {}
                    None => map.push((name, base)),
                }
            }
            let reset_address = match p.cpu_reset_address {
                Some(address) if p.integrated_rom_size == 0 => address,
                _ => lookup(&map, "rom"),
            };
            cpu.set_reset_address(reset_address);
            for master in cpu.bus_masters() {
                soc.add_master(master);
            }
            let interrupts = cpu.interrupts();
            for (name, irq) in &interrupts {
                soc.add_irq(name, *irq)?;
                irqs.reserve(*irq);
            }
            if !interrupts.is_empty() {
                soc.add_config("CPU_HAS_INTERRUPT", None);
            }
            add_cpu_constants(soc, &**cpu);
        }

        if p.integrated_rom_size > 0 {
            let mode: AccessMode = p.integrated_rom_mode.parse()?;
            soc.add_region(BusRegion::new(
                "rom",
                lookup(&map, "rom"),
                p.integrated_rom_size,
                mode,
                true,
            ))?;
        }
        if p.integrated_sram_size > 0 {
            soc.add_region(BusRegion::new(
                "sram",
                lookup(&map, "sram"),
                p.integrated_sram_size,
                AccessMode::RWX,
                true,
            ))?;
        }
        let main_ram_size = if p.integrated_main_ram_size > 0 {
            p.integrated_main_ram_size
        } else {
            p.sdram_size
        };
        if main_ram_size > 0 {
            soc.add_region(BusRegion::new(
                "main_ram",
                lookup(&map, "main_ram"),
                main_ram_size,
                AccessMode::RWX,
                true,
            ))?;
            if p.integrated_main_ram_size == 0 {
                soc.add_peripheral(
                    "sdram",
                    settings(&[
                        ("size", int(p.sdram_size)),
                        ("l2_size", int(p.l2_size)),
                    ]),
                );
            }
        }
        if let Some(cpu) = self.cpu.as_ref() {
            for region in cpu.linker_regions() {
                soc.add_region(region)?;
            }
        }
        soc.add_region(BusRegion::new(
            "csr",
            lookup(&map, "csr"),
            CSR_REGION_SIZE,
            AccessMode::RW,
            false,
        ))?;

        if !p.ident.is_empty() {
            soc.add_peripheral(
                "identifier",
                settings(&[
                    ("ident", ParamValue::Str(p.ident.clone())),
                    ("version", ParamValue::Bool(p.ident_version)),
                ]),
            );
        }
        if p.with_uartbone {
            soc.add_peripheral(
                "uartbone",
                settings(&[("baudrate", int(u64::from(p.uart_baudrate)))]),
            );
        }
        if p.with_uart {
            soc.add_peripheral(
                "uart",
                settings(&[
                    ("name", ParamValue::Str(p.uart_name.clone())),
                    ("baudrate", int(u64::from(p.uart_baudrate))),
                ]),
            );
            if self.cpu.is_some() {
                soc.add_irq("uart", irqs.next())?;
            }
        }
        if p.with_jtagbone {
            soc.add_peripheral(
                "jtagbone",
                settings(&[("chain", int(u64::from(p.jtagbone_chain)))]),
            );
        }
        if p.with_timer {
            soc.add_peripheral(
                "timer0",
                settings(&[("uptime", ParamValue::Bool(p.timer_uptime))]),
            );
            if self.cpu.is_some() {
                soc.add_irq("timer0", irqs.next())?;
            }
        }
        if p.with_watchdog {
            soc.add_peripheral(
                "watchdog",
                settings(&[("width", int(u64::from(p.watchdog_width)))]),
            );
        }

        for feature in &self.features {
            log::info!("adding {feature} to {}", self.board.name);
            soc.add_peripheral(feature, BTreeMap::new());
        }
        Ok(())
    }

    /// Assembles a fresh [`SocDescription`] and classifies its regions for
    /// the CPU's memory buses.
    pub fn describe(&mut self) -> Result<(SocDescription, Vec<MemoryRegion>), SocError> {
        let mut description = SocDescription::new();
        self.assemble(&mut description)?;
        let buses = self
            .cpu
            .as_ref()
            .map(|cpu| cpu.memory_buses())
            .unwrap_or_default();
        let regions = classify(&description.regions, &buses);
        Ok((description, regions))
    }

    /// The configuration the CPU's netlist generator would be given for
    /// `regions`, without running anything. `None` without a CPU.
    pub fn netlist_configuration(
        &self,
        regions: &[MemoryRegion],
    ) -> Result<Option<BuildConfiguration>, SocError> {
        match self.cpu.as_ref() {
            Some(cpu) => Ok(Some(cpu.build_configuration(regions)?)),
            None => Ok(None),
        }
    }

    /// Runs the full flow: CPU preparation, assembly, region classification,
    /// the cached netlist build and synthesis source collection.
    pub fn build(&mut self, netlist: &NetlistBuilder) -> Result<SocBuild, SocError> {
        if let Some(cpu) = self.cpu.as_mut() {
            cpu.prepare(netlist)?;
        }
        let (description, regions) = self.describe()?;
        let Some(cpu) = self.cpu.as_deref() else {
            log::info!("no CPU selected, skipping netlist generation");
            return Ok(SocBuild {
                description,
                regions,
                netlist: None,
                sources: SynthesisSources::default(),
            });
        };
        let reference = configure(cpu, &regions, netlist)?;
        let sources = synthesis_sources(cpu, self.board.vendor, &reference, &self.support_dir)?;
        Ok(SocBuild {
            description,
            regions,
            netlist: Some(reference),
            sources,
        })
    }
}

fn validate(params: &mut SocParams) -> Result<(), ConfigError> {
    // The uart name only matters when a uart is built.
    if params.with_uart {
        if params.uart_name == "crossover+uartbone" {
            log::warn!(
                "uart_name=\"crossover+uartbone\" is deprecated, use uart_name=\"crossover\" with with_uartbone=true"
            );
            params.uart_name = "crossover".to_string();
            params.with_uartbone = true;
        }
        if params.with_jtagbone && params.uart_name == "jtag_uart" {
            return Err(ConfigError::ValidationError(
                "jtagbone and jtag_uart cannot be used together".to_string(),
            ));
        }
        if params.with_uartbone && params.uart_name == "serial" {
            return Err(ConfigError::ValidationError(
                "uartbone and serial uart cannot share the serial port".to_string(),
            ));
        }
    }
    if params.cpu_type == NO_CPU && params.integrated_rom_size > 0 {
        log::debug!("no CPU, disabling the integrated ROM");
        params.integrated_rom_size = 0;
    }
    Ok(())
}

fn check_features(board: &CapabilityDescriptor, features: &[String]) -> Result<(), ConfigError> {
    for feature in features {
        if !has_capability(board, feature) {
            let available: Vec<&str> = board.capabilities.iter().map(String::as_str).collect();
            return Err(ConfigError::ValidationError(format!(
                "board {} does not support '{feature}', its capabilities are: {}",
                board.name,
                available.join(", ")
            )));
        }
    }
    Ok(())
}

fn add_cpu_constants(soc: &mut dyn SocAssembler, cpu: &dyn CpuCore) {
    let info = cpu.info();
    soc.add_config("CPU_RESET_ADDR", Some(format!("0x{:08x}", cpu.reset_address())));
    soc.add_config(&format!("CPU_TYPE_{}", info.name.to_uppercase()), None);
    soc.add_config(&format!("CPU_VARIANT_{}", constant_name(cpu.variant())), None);
    soc.add_config("CPU_FAMILY", Some(quoted(info.family)));
    soc.add_config("CPU_NAME", Some(quoted(info.name)));
    soc.add_config("CPU_HUMAN_NAME", Some(quoted(&info.human_name)));
    soc.add_config("CPU_NOP", Some(quoted(info.nop)));
    for (name, value) in cpu.constants() {
        soc.add_config(&name, Some(value));
    }
}

fn constant_name(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

fn quoted(s: &str) -> String {
    format!("\"{s}\"")
}

fn lookup(map: &[(String, u64)], name: &str) -> u64 {
    map.iter()
        .find(|(n, _)| n == name)
        .map(|(_, base)| *base)
        .unwrap_or(0)
}

fn int(value: u64) -> ParamValue {
    ParamValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
}

fn settings(pairs: &[(&str, ParamValue)]) -> BTreeMap<String, ParamValue> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Hands out the lowest interrupt line not yet taken.
#[derive(Debug, Default)]
struct IrqAllocator {
    used: Vec<u32>,
}

impl IrqAllocator {
    fn reserve(&mut self, irq: u32) {
        self.used.push(irq);
    }

    fn next(&mut self) -> u32 {
        let mut irq = 0;
        while self.used.contains(&irq) {
            irq += 1;
        }
        self.used.push(irq);
        irq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::BoardRegistry;
    use socgen_config::{load_config_from_str, resolve_soc, SocOverrides};
    use socgen_cpu::BusKind;
    use std::path::Path;

    fn resolved(cpu: &str, extra: &str) -> ResolvedSoc {
        let text = format!(
            "[project]\nname = \"t\"\n[soc]\nboard = \"arty\"\ncpu = \"{cpu}\"\n{extra}\n"
        );
        let config = load_config_from_str(&text).unwrap();
        resolve_soc(&config, Path::new("/p"), &SocOverrides::default()).unwrap()
    }

    fn builder<'a>(board: &str, soc: &ResolvedSoc) -> Result<SocBuilder<'a>, SocError> {
        SocBuilder::new(BoardRegistry::builtin().lookup(board).unwrap(), soc)
    }

    #[test]
    fn vexii_assembly_order_and_map() {
        let soc = resolved("vexiiriscv", "[soc.params]\nsdram_size = 0x1000000");
        let mut b = builder("arty", &soc).unwrap();
        let (desc, regions) = b.describe().unwrap();

        let names: Vec<&str> = desc.regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["rom", "sram", "main_ram", "opensbi", "csr"]);
        assert_eq!(desc.region("sram").unwrap().origin, 0x1000_0000);
        assert_eq!(desc.io_regions[0].name, "io0");

        let peripherals: Vec<&str> = desc.peripherals.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(peripherals, vec!["ctrl", "sdram", "uart", "timer0"]);

        // opensbi is linker-only and never reaches the generator
        assert!(regions.iter().all(|r| r.name != "opensbi"));
        let main_ram = regions.iter().find(|r| r.name == "main_ram").unwrap();
        assert_eq!(main_ram.bus, BusKind::Memory);
        assert_eq!(main_ram.mode.to_string(), "rwxc");
    }

    #[test]
    fn cpu_constants_are_recorded() {
        let soc = resolved("vexiiriscv", "");
        let mut b = builder("arty", &soc).unwrap();
        let (desc, _) = b.describe().unwrap();
        assert_eq!(desc.constant("CPU_RESET_ADDR"), Some(Some("0x00000000")));
        assert_eq!(desc.constant("CPU_TYPE_VEXIIRISCV"), Some(None));
        assert_eq!(desc.constant("CPU_VARIANT_LINUX"), Some(None));
        assert_eq!(desc.constant("CPU_NAME"), Some(Some("\"vexiiriscv\"")));
        assert_eq!(desc.constant("CPU_HAS_INTERRUPT"), None);
    }

    #[test]
    fn smp_reserves_its_interrupt() {
        let soc = resolved("vexriscv_smp", "");
        let mut b = builder("arty", &soc).unwrap();
        let (desc, _) = b.describe().unwrap();
        assert_eq!(desc.irqs.get("noirq"), Some(&0));
        assert_eq!(desc.irqs.get("uart"), Some(&1));
        assert_eq!(desc.irqs.get("timer0"), Some(&2));
        assert_eq!(desc.constant("CPU_HAS_INTERRUPT"), Some(None));
        assert_eq!(desc.constant("CPU_VARIANT_STANDARD"), Some(None));
    }

    #[test]
    fn reset_address_without_rom() {
        let soc = resolved(
            "vexiiriscv",
            "[soc.params]\nintegrated_rom_size = 0\ncpu_reset_address = 0x10000000",
        );
        let mut b = builder("arty", &soc).unwrap();
        let (desc, _) = b.describe().unwrap();
        assert!(desc.region("rom").is_none());
        assert_eq!(b.cpu().unwrap().reset_address(), 0x1000_0000);
        assert_eq!(desc.constant("CPU_RESET_ADDR"), Some(Some("0x10000000")));
    }

    #[test]
    fn no_cpu_disables_rom() {
        let soc = resolved("none", "");
        let mut b = builder("arty", &soc).unwrap();
        assert_eq!(b.params().integrated_rom_size, 0);
        let (desc, _) = b.describe().unwrap();
        assert!(desc.region("rom").is_none());
        assert!(desc.irqs.is_empty());
        assert!(b.netlist_configuration(&[]).unwrap().is_none());
    }

    #[test]
    fn crossover_uartbone_is_rewritten() {
        let soc = resolved("none", "[soc.params]\nuart_name = \"crossover+uartbone\"");
        let b = builder("arty", &soc).unwrap();
        assert_eq!(b.params().uart_name, "crossover");
        assert!(b.params().with_uartbone);
    }

    #[test]
    fn jtagbone_with_jtag_uart_is_rejected() {
        let soc = resolved("none", "[soc.params]\nwith_jtagbone = true");
        let err = builder("acorn", &soc).unwrap_err();
        assert!(err.to_string().contains("jtag_uart"));
    }

    #[test]
    fn uartbone_with_serial_is_rejected() {
        let soc = resolved("none", "[soc.params]\nwith_uartbone = true");
        assert!(matches!(
            builder("arty", &soc),
            Err(SocError::Config(ConfigError::ValidationError(_)))
        ));
    }

    #[test]
    fn uart_checks_are_skipped_without_uart() {
        let soc = resolved(
            "none",
            "[soc.params]\nwith_uart = false\nwith_uartbone = true",
        );
        let mut b = builder("arty", &soc).unwrap();
        assert_eq!(b.params().uart_name, "serial");
        let (desc, _) = b.describe().unwrap();
        assert!(desc.peripheral("uartbone").is_some());
        assert!(desc.peripheral("uart").is_none());

        let soc = resolved(
            "none",
            "[soc.params]\nwith_uart = false\nuart_name = \"crossover+uartbone\"",
        );
        let b = builder("arty", &soc).unwrap();
        assert_eq!(b.params().uart_name, "crossover+uartbone");
        assert!(!b.params().with_uartbone);
    }

    #[test]
    fn unsupported_feature_lists_capabilities() {
        let soc = resolved("none", "features = [\"pcie\"]");
        let err = builder("arty", &soc).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'pcie'"));
        assert!(msg.contains("ethernet"));
    }

    #[test]
    fn features_are_added_last() {
        let soc = resolved("none", "features = [\"ethernet\", \"leds\"]");
        let mut b = builder("arty", &soc).unwrap();
        let (desc, _) = b.describe().unwrap();
        let names: Vec<&str> = desc.peripherals.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names[names.len() - 2..], ["ethernet", "leds"]);
    }

    #[test]
    fn unknown_variant_fails_early() {
        let soc = resolved("vexiiriscv", "variant = \"full\"");
        assert!(matches!(builder("arty", &soc), Err(SocError::Cpu(_))));
    }

    #[test]
    fn netlist_configuration_carries_regions() {
        let soc = resolved("vexiiriscv", "");
        let mut b = builder("arty", &soc).unwrap();
        let (_, regions) = b.describe().unwrap();
        let config = b.netlist_configuration(&regions).unwrap().unwrap();
        assert!(config.contains("memory_region"));
    }

    #[cfg(unix)]
    #[test]
    fn build_runs_generator_once() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_build_tool(dir.path());
        let checkout = dir.path().join("VexiiRiscv");
        std::fs::create_dir_all(&checkout).unwrap();
        let text = format!(
            "[project]\nname = \"t\"\n[soc]\nboard = \"arty\"\ncpu = \"vexiiriscv\"\n\
             [toolchain]\nbuild_tool = \"{}\"\nvexiiriscv_dir = \"{}\"\n",
            tool.display(),
            checkout.display()
        );
        let config = load_config_from_str(&text).unwrap();
        let soc = resolve_soc(&config, dir.path(), &SocOverrides::default()).unwrap();

        let netlist = NetlistBuilder::from_resolved(&soc);
        let first = builder("arty", &soc).unwrap().build(&netlist).unwrap();
        let reference = first.netlist.unwrap();
        assert!(!reference.cache_hit);
        assert!(reference.path.is_file());
        assert_eq!(first.sources.files.last(), Some(&reference.path));

        let second = builder("arty", &soc).unwrap().build(&netlist).unwrap();
        let again = second.netlist.unwrap();
        assert!(again.cache_hit);
        assert_eq!(again.fingerprint, reference.fingerprint);
    }

    /// A stand-in for `sbt` that writes whatever output file it is asked for.
    #[cfg(unix)]
    fn fake_build_tool(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-sbt");
        let script = r#"#!/bin/sh
task="$1"
echo "$task" >> invocations.log
name=""; netdir=""; py=""
for word in $task; do
  case "$word" in
    --netlist-name=*) name="${word#--netlist-name=}" ;;
    --netlist-directory=*) netdir="${word#--netlist-directory=}" ;;
    --python-file=*) py="${word#--python-file=}" ;;
  esac
done
if [ -n "$py" ]; then
  printf 'VexiiRiscv.xlen = 32\nVexiiRiscv.with_rvc = False\n' > "$py"
fi
if [ -n "$name" ]; then
  echo "module $name();" > "$netdir/$name.v"
  echo "endmodule" >> "$netdir/$name.v"
fi
"#;
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}
