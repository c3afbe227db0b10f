//! The set of selectable CPUs.

use serde::Serialize;

use crate::error::CpuError;
use crate::interface::{CpuCore, CpuSettings};
use crate::{vexiiriscv, vexriscv_smp, VexRiscvSmp, VexiiRiscv};

/// Name of the CPU-less configuration.
pub const NO_CPU: &str = "none";

/// A CPU that can be requested by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuDescriptor {
    /// Registry name.
    pub name: &'static str,
    /// Display name.
    pub human_name: &'static str,
    /// Supported variants; empty for `none`.
    pub variants: &'static [&'static str],
    /// Variant used when none is requested.
    pub default_variant: Option<&'static str>,
}

/// Read-only lookup of CPU descriptors.
#[derive(Debug, Clone)]
pub struct CpuRegistry {
    descriptors: Vec<CpuDescriptor>,
}

impl Default for CpuRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CpuRegistry {
    /// The CPUs this build supports.
    pub fn builtin() -> Self {
        Self {
            descriptors: vec![
                CpuDescriptor {
                    name: NO_CPU,
                    human_name: "No CPU",
                    variants: &[],
                    default_variant: None,
                },
                CpuDescriptor {
                    name: vexriscv_smp::NAME,
                    human_name: "VexRiscv SMP",
                    variants: vexriscv_smp::VARIANTS,
                    default_variant: Some(vexriscv_smp::DEFAULT_VARIANT),
                },
                CpuDescriptor {
                    name: vexiiriscv::NAME,
                    human_name: "VexiiRiscv",
                    variants: vexiiriscv::VARIANTS,
                    default_variant: Some(vexiiriscv::DEFAULT_VARIANT),
                },
            ],
        }
    }

    /// Every descriptor, in registration order.
    pub fn descriptors(&self) -> &[CpuDescriptor] {
        &self.descriptors
    }

    /// Every CPU name, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.descriptors.iter().map(|d| d.name).collect()
    }

    /// Looks up `name`, failing with a list of valid names.
    pub fn lookup(&self, name: &str) -> Result<&CpuDescriptor, CpuError> {
        self.descriptors
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| CpuError::UnknownCpu {
                name: name.to_string(),
                available: self.names().iter().map(|n| n.to_string()).collect(),
            })
    }

    /// Resolves the variant to build, failing with the valid variants.
    pub fn resolve_variant(
        &self,
        name: &str,
        variant: Option<&str>,
    ) -> Result<Option<&'static str>, CpuError> {
        let descriptor = self.lookup(name)?;
        let Some(requested) = variant else {
            return Ok(descriptor.default_variant);
        };
        descriptor
            .variants
            .iter()
            .find(|v| **v == requested)
            .map(|v| Some(*v))
            .ok_or_else(|| CpuError::UnknownVariant {
                cpu: name.to_string(),
                variant: requested.to_string(),
                available: descriptor.variants.iter().map(|v| v.to_string()).collect(),
            })
    }

    /// Instantiates the CPU. `none` yields `Ok(None)`.
    pub fn create(
        &self,
        name: &str,
        variant: Option<&str>,
        settings: &CpuSettings,
    ) -> Result<Option<Box<dyn CpuCore>>, CpuError> {
        let variant = self.resolve_variant(name, variant)?;
        let core: Box<dyn CpuCore> = match (name, variant) {
            (vexriscv_smp::NAME, Some(v)) => Box::new(VexRiscvSmp::new(v, settings)?),
            (vexiiriscv::NAME, Some(v)) => Box::new(VexiiRiscv::new(v, settings)?),
            _ => return Ok(None),
        };
        log::debug!("selected CPU {} ({})", name, core.variant());
        Ok(Some(core))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_in_order() {
        assert_eq!(
            CpuRegistry::builtin().names(),
            vec!["none", "vexriscv_smp", "vexiiriscv"]
        );
    }

    #[test]
    fn unknown_cpu_enumerates_alternatives() {
        let err = CpuRegistry::builtin().lookup("picorv32").unwrap_err();
        match err {
            CpuError::UnknownCpu { name, available } => {
                assert_eq!(name, "picorv32");
                assert_eq!(available.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_variant_enumerates_alternatives() {
        let err = CpuRegistry::builtin()
            .resolve_variant("vexiiriscv", Some("full"))
            .unwrap_err();
        match err {
            CpuError::UnknownVariant { cpu, available, .. } => {
                assert_eq!(cpu, "vexiiriscv");
                assert_eq!(available, vec!["standard", "linux", "debian"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn default_variants() {
        let registry = CpuRegistry::builtin();
        assert_eq!(registry.resolve_variant("vexiiriscv", None).unwrap(), Some("linux"));
        assert_eq!(
            registry.resolve_variant("vexriscv_smp", None).unwrap(),
            Some("standard")
        );
        assert_eq!(registry.resolve_variant("none", None).unwrap(), None);
    }

    #[test]
    fn none_creates_nothing() {
        let cpu = CpuRegistry::builtin()
            .create("none", None, &CpuSettings::default())
            .unwrap();
        assert!(cpu.is_none());
    }

    #[test]
    fn none_has_no_variants() {
        assert!(CpuRegistry::builtin()
            .create("none", Some("standard"), &CpuSettings::default())
            .is_err());
    }

    #[test]
    fn creates_each_cpu() {
        let registry = CpuRegistry::builtin();
        let smp = registry
            .create("vexriscv_smp", Some("linux+cfu"), &CpuSettings::default())
            .unwrap()
            .unwrap();
        assert_eq!(smp.info().name, "vexriscv_smp");
        assert_eq!(smp.variant(), "linux+cfu");

        let vexii = registry
            .create("vexiiriscv", None, &CpuSettings::default())
            .unwrap()
            .unwrap();
        assert_eq!(vexii.variant(), "linux");
    }
}
