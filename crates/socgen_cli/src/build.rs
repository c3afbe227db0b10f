//! `socgen build`: the full flow from project to cached netlist.
//!
//! 1. Resolve the project's SoC with command-line overrides
//! 2. Look up the board and assemble the SoC
//! 3. Classify regions and build the CPU netlist through the cache
//! 4. Write `soc.json` and `sources.txt`

use std::path::{Path, PathBuf};
use std::time::Duration;

use socgen_cpu::NetlistBuilder;
use socgen_invoke::CancelFlag;
use socgen_soc::{BoardRegistry, SocBuild, SocBuilder};

use crate::project::{load_soc, overrides};
use crate::{BuildArgs, GlobalArgs};

/// Runs the `socgen build` command.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut soc_overrides = overrides(&args.soc);
    soc_overrides.no_netlist_cache = args.no_netlist_cache;
    soc_overrides.timeout_secs = args.timeout;
    let (project_dir, soc) = load_soc(global, &soc_overrides)?;

    if !global.quiet {
        eprintln!("   Building {} for {}", soc.name, soc.board);
    }

    let board = BoardRegistry::builtin().lookup(&soc.board)?;
    let mut builder = SocBuilder::new(board, &soc)?;

    if !global.quiet {
        match builder.cpu() {
            Some(cpu) => eprintln!("        CPU {} ({})", cpu.info().human_name, cpu.variant()),
            None => eprintln!("        CPU none"),
        }
    }

    let netlist = NetlistBuilder::from_resolved(&soc).cancel_on(interrupt_flag());
    let started = std::time::Instant::now();
    let build = builder.build(&netlist)?;

    if !global.quiet {
        if let Some(ref reference) = build.netlist {
            let how = if reference.cache_hit { "Cached" } else { "Generated" };
            eprintln!(
                "  {how:>9} {} ({}) in {}",
                reference.module_name,
                reference.fingerprint,
                elapsed(started.elapsed())
            );
        }
    }

    let out_dir = match args.output_dir {
        Some(ref dir) => PathBuf::from(dir),
        None => project_dir.join("build").join(&soc.board),
    };
    let written = write_outputs(&out_dir, &build)?;

    if !global.quiet {
        for path in &written {
            eprintln!("    Wrote {}", path.display());
        }
        eprintln!("   Build complete.");
    }
    if let Some(ref reference) = build.netlist {
        println!("{}", reference.path.display());
    }
    Ok(0)
}

/// Writes `soc.json` and `sources.txt` into `dir` and returns their paths.
pub fn write_outputs(dir: &Path, build: &SocBuild) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;

    let soc_json = dir.join("soc.json");
    std::fs::write(&soc_json, serde_json::to_string_pretty(build)? + "\n")?;

    let sources = dir.join("sources.txt");
    let mut text = String::new();
    for file in &build.sources.files {
        text.push_str(&file.display().to_string());
        text.push('\n');
    }
    for command in &build.sources.toolchain_commands {
        text.push_str("# ");
        text.push_str(command);
        text.push('\n');
    }
    std::fs::write(&sources, text)?;

    Ok(vec![soc_json, sources])
}

fn elapsed(d: Duration) -> String {
    if d.as_secs() >= 60 {
        format!("{}m {:02}s", d.as_secs() / 60, d.as_secs() % 60)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}

/// A flag raised by Ctrl-C.
///
/// A running generator is killed at its next status poll, so the build
/// unwinds and releases its lock and staging directory.
fn interrupt_flag() -> CancelFlag {
    let flag = CancelFlag::new();
    let handler = flag.clone();
    if let Err(e) = ctrlc::set_handler(move || handler.cancel()) {
        log::warn!("Ctrl-C will not stop generators cleanly: {e}");
    }
    flag
}

#[cfg(test)]
mod tests {
    use super::*;
    use socgen_cpu::SynthesisSources;
    use socgen_soc::SocDescription;
    use tempfile::TempDir;

    #[test]
    fn outputs_are_written() {
        let tmp = TempDir::new().unwrap();
        let build = SocBuild {
            description: SocDescription::new(),
            regions: Vec::new(),
            netlist: None,
            sources: SynthesisSources {
                files: vec![PathBuf::from("/support/Ram_1w_1rs_Intel.v")],
                toolchain_commands: vec!["set_global_assignment -name VERILOG_MACRO \"SYNTHESIS=1\"".to_string()],
            },
        };
        let out = tmp.path().join("build").join("de10nano");
        let written = write_outputs(&out, &build).unwrap();
        assert_eq!(written.len(), 2);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();
        assert!(json["netlist"].is_null());
        assert!(json["description"]["regions"].as_array().unwrap().is_empty());

        let sources = std::fs::read_to_string(&written[1]).unwrap();
        assert_eq!(
            sources,
            "/support/Ram_1w_1rs_Intel.v\n# set_global_assignment -name VERILOG_MACRO \"SYNTHESIS=1\"\n"
        );
    }

    #[test]
    fn elapsed_formatting() {
        assert_eq!(elapsed(Duration::from_millis(1500)), "1.50s");
        assert_eq!(elapsed(Duration::from_secs(125)), "2m 05s");
    }
}
