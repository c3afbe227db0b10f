//! Files and toolchain commands a CPU contributes to synthesis.

use std::path::{Path, PathBuf};

use serde::Serialize;
use socgen_common::Vendor;

use crate::error::CpuError;
use crate::interface::CpuCore;
use crate::netlist::NetlistReference;

/// What the vendor toolchain needs for the CPU.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SynthesisSources {
    /// Verilog files in the order they must be added.
    pub files: Vec<PathBuf>,
    /// Extra toolchain commands (for Quartus, `.qsf` lines).
    pub toolchain_commands: Vec<String>,
}

/// Collects the synthesis inputs of `core` on a `vendor` part.
///
/// RAM models come from `support_dir`; a model missing there is reported
/// with a warning since the vendor flow may provide it. User CFU/CXU sources
/// must exist. The netlist comes last.
pub fn synthesis_sources(
    core: &dyn CpuCore,
    vendor: Vendor,
    netlist: &NetlistReference,
    support_dir: &Path,
) -> Result<SynthesisSources, CpuError> {
    let mut files = Vec::new();
    for model in core.ram_models(vendor) {
        let path = support_dir.join(model);
        if !path.is_file() {
            log::warn!("RAM model {} not found", path.display());
        }
        files.push(path);
    }
    files.extend(core.required_sources()?);
    files.push(netlist.path.clone());
    Ok(SynthesisSources {
        files,
        toolchain_commands: core.toolchain_commands(vendor),
    })
}
