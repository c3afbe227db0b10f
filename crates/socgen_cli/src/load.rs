//! `socgen load`: bitstream loading through a board's external loader.
//!
//! Vendor programmers are driven by the board platform and are not run
//! here; for those boards the command reports what the platform would do.

use std::path::Path;

use socgen_invoke::{invoke, InvokeOptions};
use socgen_soc::{BoardRegistry, CapabilityDescriptor, LoadMethod};

use crate::{GlobalArgs, LoadArgs};

/// Runs the `socgen load` command.
pub fn run(args: &LoadArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let board = BoardRegistry::builtin().lookup(&args.board)?;
    if args.flash {
        println!("{}", flash_summary(board, &args.bitstream));
        return Ok(0);
    }
    let Some(command) = board.load.command(&args.bitstream) else {
        println!("{}", programmer_summary(board, &args.bitstream));
        return Ok(0);
    };
    if !Path::new(&args.bitstream).is_file() {
        return Err(format!("bitstream {} not found", args.bitstream).into());
    }
    if !global.quiet {
        eprintln!("   Loading {} onto {}", args.bitstream, board.name);
    }
    invoke(&command, &std::env::current_dir()?, &InvokeOptions::default())?;
    Ok(0)
}

fn programmer_summary(board: &CapabilityDescriptor, bitstream: &str) -> String {
    match board.load {
        LoadMethod::ProgrammerDevice(device) => format!(
            "{}: load {bitstream} with the {} programmer on JTAG device {device}",
            board.name, board.platform
        ),
        _ => format!(
            "{}: load {bitstream} with the {} programmer",
            board.name, board.platform
        ),
    }
}

fn flash_summary(board: &CapabilityDescriptor, bitstream: &str) -> String {
    format!(
        "{}: flash {} with the {} programmer",
        board.name,
        board.flash.image(bitstream),
        board.platform
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(load: fn(&LoadMethod) -> bool) -> &'static CapabilityDescriptor {
        BoardRegistry::builtin()
            .iter()
            .find(|b| load(&b.load))
            .unwrap()
    }

    #[test]
    fn external_loader_substitutes_bitstream() {
        let board = board_with(|l| matches!(l, LoadMethod::External(_)));
        let command = board.load.command("top.bit").unwrap();
        assert!(command.iter().any(|a| a == "top.bit"));
    }

    #[test]
    fn programmer_boards_are_reported() {
        let arty = BoardRegistry::builtin().lookup("arty").unwrap();
        assert_eq!(
            programmer_summary(arty, "top.bit"),
            "arty: load top.bit with the digilent_arty programmer"
        );
    }

    #[test]
    fn device_index_is_reported() {
        let board = board_with(|l| matches!(l, LoadMethod::ProgrammerDevice(_)));
        assert!(programmer_summary(board, "top.bit").contains("JTAG device"));
    }

    #[test]
    fn fallback_flash_image() {
        let board = BoardRegistry::builtin().lookup("acornpcie").unwrap();
        assert_eq!(
            flash_summary(board, "top.bin"),
            "acornpcie: flash top_fallback.bin with the sqrl_acorn programmer"
        );
    }

    #[test]
    fn missing_bitstream_fails_before_loading() {
        let board = board_with(|l| matches!(l, LoadMethod::External(_)));
        let args = LoadArgs {
            board: board.name.to_string(),
            bitstream: "/nonexistent/top.bit".to_string(),
            flash: false,
        };
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            config: None,
        };
        let err = run(&args, &global).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
