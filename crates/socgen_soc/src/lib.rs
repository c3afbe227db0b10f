//! Boards and SoC assembly.
//!
//! The [`BoardRegistry`] knows every supported board and what it can add.
//! [`SocBuilder`] resolves a project's SoC parameters for a board, assembles
//! the SoC through a [`SocAssembler`] and builds the CPU netlist for the
//! resulting memory regions.

#![warn(missing_docs)]

pub mod assembler;
pub mod boards;
pub mod builder;
pub mod error;
pub mod params;
pub mod registry;

pub use assembler::{IoRegion, Peripheral, SocAssembler, SocDescription};
pub use boards::{FlashMethod, LoadMethod, BOARDS};
pub use builder::{SocBuild, SocBuilder, BASE_MEMORY_MAP};
pub use error::SocError;
pub use params::{ParamValue, SocParams};
pub use registry::{has_capability, BoardRegistry, CapabilityDescriptor};
