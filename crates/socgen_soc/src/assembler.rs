//! The hooks a SoC description is assembled through.

use std::collections::BTreeMap;

use serde::Serialize;
use socgen_config::ConfigError;
use socgen_cpu::{BusMaster, BusRegion};

use crate::params::ParamValue;

/// Receives the pieces of a SoC in assembly order.
pub trait SocAssembler {
    /// Adds a bus region. Overlapping decoded regions are rejected.
    fn add_region(&mut self, region: BusRegion) -> Result<(), ConfigError>;

    /// Marks `[origin, origin + size)` as uncached IO space.
    fn add_io_region(&mut self, name: &str, origin: u64, size: u64);

    /// Adds a bus master.
    fn add_master(&mut self, master: BusMaster);

    /// Adds a peripheral with its settings.
    fn add_peripheral(&mut self, name: &str, settings: BTreeMap<String, ParamValue>);

    /// Assigns interrupt line `irq` to `name`. A line is used only once.
    fn add_irq(&mut self, name: &str, irq: u32) -> Result<(), ConfigError>;

    /// Adds a `#define`-style constant, with or without a value.
    fn add_config(&mut self, name: &str, value: Option<String>);
}

/// An IO region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IoRegion {
    /// Region name.
    pub name: String,
    /// Base address.
    pub origin: u64,
    /// Size in bytes.
    pub size: u64,
}

/// A peripheral and its settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Peripheral {
    /// Peripheral name.
    pub name: String,
    /// Settings, sorted by key.
    pub settings: BTreeMap<String, ParamValue>,
}

/// A recorded SoC, written out as `soc.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SocDescription {
    /// Bus regions in the order they were added.
    pub regions: Vec<BusRegion>,
    /// IO regions in the order they were added.
    pub io_regions: Vec<IoRegion>,
    /// Bus masters in the order they were added.
    pub masters: Vec<BusMaster>,
    /// Peripherals in the order they were added.
    pub peripherals: Vec<Peripheral>,
    /// Interrupt assignments, sorted by name.
    pub irqs: BTreeMap<String, u32>,
    /// Constants in the order they were added; a later value for the same
    /// name replaces the earlier one in place.
    pub constants: Vec<(String, Option<String>)>,
}

impl SocDescription {
    /// An empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a region by name.
    pub fn region(&self, name: &str) -> Option<&BusRegion> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Looks up a peripheral by name.
    pub fn peripheral(&self, name: &str) -> Option<&Peripheral> {
        self.peripherals.iter().find(|p| p.name == name)
    }

    /// The value of constant `name`; `Some(None)` for a bare define.
    pub fn constant(&self, name: &str) -> Option<Option<&str>> {
        self.constants
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_deref())
    }

    /// Serializes the description as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn overlaps(a: &BusRegion, b: &BusRegion) -> bool {
    let a_end = a.origin.saturating_add(a.size);
    let b_end = b.origin.saturating_add(b.size);
    a.origin < b_end && b.origin < a_end
}

impl SocAssembler for SocDescription {
    fn add_region(&mut self, region: BusRegion) -> Result<(), ConfigError> {
        if self.region(&region.name).is_some() {
            return Err(ConfigError::ValidationError(format!(
                "region '{}' already exists",
                region.name
            )));
        }
        if !region.linker {
            if let Some(other) = self
                .regions
                .iter()
                .find(|r| !r.linker && overlaps(r, &region))
            {
                return Err(ConfigError::ValidationError(format!(
                    "region '{}' (0x{:08x}-0x{:08x}) overlaps '{}'",
                    region.name,
                    region.origin,
                    region.origin.saturating_add(region.size),
                    other.name
                )));
            }
        }
        log::debug!(
            "region {} at 0x{:08x}, size 0x{:x}, mode {}",
            region.name,
            region.origin,
            region.size,
            region.mode
        );
        self.regions.push(region);
        Ok(())
    }

    fn add_io_region(&mut self, name: &str, origin: u64, size: u64) {
        self.io_regions.push(IoRegion {
            name: name.to_string(),
            origin,
            size,
        });
    }

    fn add_master(&mut self, master: BusMaster) {
        self.masters.push(master);
    }

    fn add_peripheral(&mut self, name: &str, settings: BTreeMap<String, ParamValue>) {
        log::debug!("peripheral {name}");
        self.peripherals.push(Peripheral {
            name: name.to_string(),
            settings,
        });
    }

    fn add_irq(&mut self, name: &str, irq: u32) -> Result<(), ConfigError> {
        if let Some((owner, _)) = self.irqs.iter().find(|(_, n)| **n == irq) {
            return Err(ConfigError::ValidationError(format!(
                "interrupt {irq} of '{name}' is already used by '{owner}'"
            )));
        }
        self.irqs.insert(name.to_string(), irq);
        Ok(())
    }

    fn add_config(&mut self, name: &str, value: Option<String>) {
        match self.constants.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.constants.push((name.to_string(), value)),
        }
    }
}
