//! CPU cores and their netlist builds.
//!
//! A [`CpuCore`] describes a soft CPU to the SoC builder (memory map, bus
//! masters, interrupts) and derives the [`BuildConfiguration`] its external
//! generator needs. [`configure`] turns that configuration into a cached
//! netlist, running the generator only on a cache miss.
//!
//! [`BuildConfiguration`]: socgen_config::BuildConfiguration

#![warn(missing_docs)]

pub mod error;
pub mod interface;
pub mod netlist;
pub mod options;
pub mod params_file;
pub mod region;
pub mod registry;
pub mod sources;
pub mod vexiiriscv;
pub mod vexriscv_smp;

pub use error::CpuError;
pub use interface::{
    module_name, BusMaster, BusStandard, CpuCore, CpuInfo, CpuSettings, Generator,
    OutputConvention,
};
pub use netlist::{configure, NetlistBuilder, NetlistReference, CACHE_LAYOUT};
pub use params_file::{GeneratedParams, ParamValue};
pub use region::{classify, regions_to_option, AccessMode, BusKind, BusRegion, MemoryRegion};
pub use registry::{CpuDescriptor, CpuRegistry, NO_CPU};
pub use sources::{synthesis_sources, SynthesisSources};
pub use vexiiriscv::VexiiRiscv;
pub use vexriscv_smp::VexRiscvSmp;
