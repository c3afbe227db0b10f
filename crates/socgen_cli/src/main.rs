//! socgen CLI: board and CPU queries, netlist builds and cache maintenance.
//!
//! `socgen build` runs the full flow for the project's SoC; `socgen
//! fingerprint` shows what a build would be keyed on without running
//! anything.

#![warn(missing_docs)]

mod boards;
mod build;
mod cache;
mod cpus;
mod fingerprint;
mod load;
mod project;

use std::process;

use clap::{Parser, Subcommand};

/// socgen: FPGA SoC generation with cached CPU netlists.
#[derive(Parser, Debug)]
#[command(name = "socgen", version, about = "FPGA SoC generator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `socgen.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List supported boards.
    Boards {
        /// Only list boards with this capability.
        #[arg(long)]
        capability: Option<String>,
    },
    /// Show a board's capabilities and default parameters.
    Board {
        /// Board name.
        name: String,

        /// Print the descriptor as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List CPUs and their variants.
    Cpus,
    /// Print the netlist configuration and fingerprint without building.
    Fingerprint(SocArgs),
    /// Build the SoC's CPU netlist and write the SoC description.
    Build(BuildArgs),
    /// Inspect or maintain the netlist cache.
    Cache {
        /// The cache operation.
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Load a bitstream onto a board.
    Load(LoadArgs),
}

/// Overrides of the project's `[soc]` section.
#[derive(Parser, Debug, Default)]
pub struct SocArgs {
    /// Board name, replacing `soc.board`.
    #[arg(short, long)]
    pub board: Option<String>,

    /// CPU name, replacing `soc.cpu`.
    #[arg(long)]
    pub cpu: Option<String>,

    /// CPU variant, replacing `soc.variant`.
    #[arg(long)]
    pub variant: Option<String>,

    /// Board feature to add; may be repeated.
    #[arg(long = "feature")]
    pub features: Vec<String>,
}

/// Arguments for the `socgen build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// SoC selection.
    #[command(flatten)]
    pub soc: SocArgs,

    /// Regenerate the netlist even when it is cached.
    #[arg(long)]
    pub no_netlist_cache: bool,

    /// Kill a generator after this many seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output directory (default: `build/<board>` in the project).
    #[arg(short, long)]
    pub output_dir: Option<String>,
}

/// `socgen cache` operations.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// List cached artifacts.
    List,
    /// Check every cached artifact against its checksum.
    Verify,
    /// Remove every cached artifact.
    Clear,
}

/// Arguments for the `socgen load` subcommand.
#[derive(Parser, Debug)]
pub struct LoadArgs {
    /// Board name.
    pub board: String,

    /// Bitstream to load.
    pub bitstream: String,

    /// Report the flash image instead of loading into volatile configuration.
    #[arg(long)]
    pub flash: bool,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

/// The default log filter for the global flags; `RUST_LOG` overrides it.
fn log_filter(global: &GlobalArgs) -> &'static str {
    if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    }
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(&global)))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Command::Boards { ref capability } => boards::list(capability.as_deref(), &global),
        Command::Board { ref name, json } => boards::show(name, json),
        Command::Cpus => cpus::run(),
        Command::Fingerprint(ref args) => fingerprint::run(args, &global),
        Command::Build(ref args) => build::run(args, &global),
        Command::Cache { action } => cache::run(action, &global),
        Command::Load(ref args) => load::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
