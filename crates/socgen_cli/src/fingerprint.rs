//! `socgen fingerprint`: what a build would be keyed on, without running it.

use socgen_config::{canonical_string, fingerprint};
use socgen_cpu::{module_name, NetlistBuilder};
use socgen_soc::{BoardRegistry, SocBuilder};

use crate::project::{load_soc, overrides};
use crate::{GlobalArgs, SocArgs};

/// Runs the `socgen fingerprint` command.
pub fn run(args: &SocArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (_, soc) = load_soc(global, &overrides(args))?;
    let board = BoardRegistry::builtin().lookup(&soc.board)?;
    let mut builder = SocBuilder::new(board, &soc)?;
    let (_, regions) = builder.describe()?;

    let (Some(config), Some(cpu)) = (builder.netlist_configuration(&regions)?, builder.cpu())
    else {
        if !global.quiet {
            eprintln!("   No CPU selected, nothing to generate");
        }
        return Ok(0);
    };

    let canonical = canonical_string(&config)?;
    let fp = fingerprint(&config)?;
    let resolution = NetlistBuilder::from_resolved(&soc).resolve(&cpu.generator(), &config)?;

    let label = cpu.label(&config);
    println!("label:       {label}");
    println!("module:      {}", module_name(&label, &fp));
    println!("canonical:   {canonical}");
    println!("fingerprint: {fp}");
    println!("netlist:     {}", resolution.artifact_path.display());
    println!("cached:      {}", if resolution.cache_hit { "yes" } else { "no" });
    Ok(0)
}
