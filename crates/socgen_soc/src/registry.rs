//! Board capability lookup.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use serde::Serialize;
use socgen_common::Vendor;

use crate::boards::{BoardSpec, FlashMethod, LoadMethod, Param, BOARDS};
use crate::error::SocError;
use crate::params::ParamValue;

/// Everything the builder needs to know about a board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityDescriptor {
    /// Board name.
    pub name: String,
    /// FPGA vendor.
    pub vendor: Vendor,
    /// Target module providing the platform.
    pub platform: String,
    /// Optional features the board supports.
    pub capabilities: BTreeSet<String>,
    /// Board-specific SoC parameters.
    pub defaults: BTreeMap<String, ParamValue>,
    /// Bitstream loading.
    pub load: LoadMethod,
    /// Flash programming.
    pub flash: FlashMethod,
}

impl From<&BoardSpec> for CapabilityDescriptor {
    fn from(spec: &BoardSpec) -> Self {
        Self {
            name: spec.name.to_string(),
            vendor: spec.vendor,
            platform: spec.platform.to_string(),
            capabilities: spec.capabilities.iter().map(|c| c.to_string()).collect(),
            defaults: spec
                .defaults
                .iter()
                .map(|(k, v)| {
                    let value = match *v {
                        Param::Int(i) => ParamValue::Int(i),
                        Param::Str(s) => ParamValue::Str(s.to_string()),
                        Param::Bool(b) => ParamValue::Bool(b),
                    };
                    (k.to_string(), value)
                })
                .collect(),
            load: spec.load,
            flash: spec.flash,
        }
    }
}

/// Returns `true` if `board` declares `capability`.
pub fn has_capability(board: &CapabilityDescriptor, capability: &str) -> bool {
    board.capabilities.contains(capability)
}

/// Read-only board lookup by name.
#[derive(Debug, Clone)]
pub struct BoardRegistry {
    boards: BTreeMap<String, CapabilityDescriptor>,
}

impl BoardRegistry {
    /// The builtin boards, built once per process.
    pub fn builtin() -> &'static BoardRegistry {
        static BUILTIN: OnceLock<BoardRegistry> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            Self::from_descriptors(BOARDS.iter().map(CapabilityDescriptor::from))
        })
    }

    /// A registry over `descriptors`; a later duplicate name replaces an
    /// earlier one.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = CapabilityDescriptor>) -> Self {
        Self {
            boards: descriptors
                .into_iter()
                .map(|d| (d.name.clone(), d))
                .collect(),
        }
    }

    /// Looks up `name`, failing with every valid name.
    pub fn lookup(&self, name: &str) -> Result<&CapabilityDescriptor, SocError> {
        self.boards.get(name).ok_or_else(|| SocError::UnknownBoard {
            name: name.to_string(),
            available: self.names().iter().map(|n| n.to_string()).collect(),
        })
    }

    /// Every board name, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.boards.keys().map(String::as_str).collect()
    }

    /// The capabilities of board `name`.
    pub fn capabilities(&self, name: &str) -> Result<&BTreeSet<String>, SocError> {
        Ok(&self.lookup(name)?.capabilities)
    }

    /// Boards declaring `capability`, sorted by name.
    pub fn with_capability(&self, capability: &str) -> Vec<&CapabilityDescriptor> {
        self.boards
            .values()
            .filter(|b| has_capability(b, capability))
            .collect()
    }

    /// Every descriptor, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.boards.values()
    }

    /// Number of boards.
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    /// Returns `true` if the registry holds no boards.
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}
