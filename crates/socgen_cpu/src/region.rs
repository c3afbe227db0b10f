//! Memory-region classification for the generator's `--memory-region` list.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use socgen_config::{ConfigError, OptionValue, Scalar};

use crate::interface::BusMaster;

/// Access rights of a region: a subset of read, write, execute and cacheable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AccessMode {
    /// Readable.
    pub read: bool,
    /// Writable.
    pub write: bool,
    /// Executable.
    pub execute: bool,
    /// Cacheable.
    pub cacheable: bool,
}

impl AccessMode {
    /// Read and execute, the mode of ROMs.
    pub const RX: AccessMode = AccessMode {
        read: true,
        write: false,
        execute: true,
        cacheable: false,
    };

    /// Read, write and execute, the mode of RAMs.
    pub const RWX: AccessMode = AccessMode {
        read: true,
        write: true,
        execute: true,
        cacheable: false,
    };

    /// Read and write, the mode of IO regions.
    pub const RW: AccessMode = AccessMode {
        read: true,
        write: true,
        execute: false,
        cacheable: false,
    };

    /// Returns the same mode with the cacheable bit set to `cached`.
    pub fn with_cacheable(self, cached: bool) -> Self {
        Self {
            cacheable: cached,
            ..self
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (set, c) in [
            (self.read, 'r'),
            (self.write, 'w'),
            (self.execute, 'x'),
            (self.cacheable, 'c'),
        ] {
            if set {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for AccessMode {
    type Err = ConfigError;

    /// Parses a base mode over `r`, `w` and `x`. Cacheability is a region
    /// property, not part of the declared mode.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mode = AccessMode::default();
        for c in s.chars() {
            match c {
                'r' => mode.read = true,
                'w' => mode.write = true,
                'x' => mode.execute = true,
                _ => {
                    return Err(ConfigError::ValidationError(format!(
                        "invalid access mode '{s}' (expected letters from 'rwx')"
                    )))
                }
            }
        }
        Ok(mode)
    }
}

impl Serialize for AccessMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Which generator-side bus serves a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    /// Served through the peripheral bus (`p`).
    Peripheral,
    /// Served through a dedicated memory bus (`m`).
    Memory,
}

impl BusKind {
    /// The generator's one-letter code.
    pub fn code(&self) -> &'static str {
        match self {
            BusKind::Peripheral => "p",
            BusKind::Memory => "m",
        }
    }
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A region as declared on the SoC bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusRegion {
    /// Region name (`rom`, `sram`, `main_ram`, `io0`, ...).
    pub name: String,
    /// Base address.
    pub origin: u64,
    /// Size in bytes.
    pub size: u64,
    /// Declared access mode.
    pub mode: AccessMode,
    /// Whether accesses may be cached.
    pub cached: bool,
    /// Linker-only region with no physical backing.
    pub linker: bool,
}

impl BusRegion {
    /// A physical region.
    pub fn new(name: &str, origin: u64, size: u64, mode: AccessMode, cached: bool) -> Self {
        Self {
            name: name.to_string(),
            origin,
            size,
            mode,
            cached,
            linker: false,
        }
    }

    /// A linker-only region.
    pub fn linker(name: &str, origin: u64, size: u64, mode: AccessMode) -> Self {
        Self {
            linker: true,
            ..Self::new(name, origin, size, mode, true)
        }
    }
}

/// A region as passed to the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryRegion {
    /// Region name, kept for diagnostics.
    pub name: String,
    /// Base address.
    pub origin: u64,
    /// Size in bytes.
    pub size: u64,
    /// Declared mode plus the cacheable bit.
    pub mode: AccessMode,
    /// Serving bus.
    pub bus: BusKind,
}

/// Derives the generator's region list from the SoC bus regions.
///
/// Linker-only regions are dropped. `main_ram` is served by the memory bus
/// when the CPU has at least one memory bus master; every other region goes
/// through the peripheral bus. Input order is kept.
pub fn classify(regions: &[BusRegion], memory_buses: &[BusMaster]) -> Vec<MemoryRegion> {
    regions
        .iter()
        .filter(|r| !r.linker)
        .map(|r| MemoryRegion {
            name: r.name.clone(),
            origin: r.origin,
            size: r.size,
            mode: r.mode.with_cacheable(r.cached),
            bus: if r.name == "main_ram" && !memory_buses.is_empty() {
                BusKind::Memory
            } else {
                BusKind::Peripheral
            },
        })
        .collect()
}

/// Converts classified regions into the `memory_region` option value, one
/// `(origin, size, mode, bus)` tuple per region.
pub fn regions_to_option(regions: &[MemoryRegion]) -> Result<OptionValue, ConfigError> {
    let mut tuples = Vec::with_capacity(regions.len());
    for r in regions {
        tuples.push(vec![
            Scalar::Int(to_i64(r.origin)?),
            Scalar::Int(to_i64(r.size)?),
            Scalar::Str(r.mode.to_string()),
            Scalar::Str(r.bus.code().to_string()),
        ]);
    }
    Ok(OptionValue::Tuples(tuples))
}

fn to_i64(v: u64) -> Result<i64, ConfigError> {
    i64::try_from(v).map_err(|_| ConfigError::UnsupportedValue {
        key: "memory_region".to_string(),
        found: format!("integer {v} out of range"),
    })
}
