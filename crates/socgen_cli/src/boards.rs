//! `socgen boards` and `socgen board`.

use socgen_soc::{BoardRegistry, CapabilityDescriptor};

use crate::GlobalArgs;

/// Lists every board, or those declaring `capability`.
pub fn list(capability: Option<&str>, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let registry = BoardRegistry::builtin();
    let boards: Vec<&CapabilityDescriptor> = match capability {
        Some(cap) => registry.with_capability(cap),
        None => registry.iter().collect(),
    };
    for board in &boards {
        println!("{}", board_line(board));
    }
    if !global.quiet {
        eprintln!("   {} board(s)", boards.len());
    }
    Ok(0)
}

/// Prints one board's descriptor.
pub fn show(name: &str, json: bool) -> Result<i32, Box<dyn std::error::Error>> {
    let board = BoardRegistry::builtin().lookup(name)?;
    if json {
        println!("{}", serde_json::to_string_pretty(board)?);
        return Ok(0);
    }
    println!("name:         {}", board.name);
    println!("vendor:       {}", board.vendor.as_str());
    println!("platform:     {}", board.platform);
    let caps: Vec<&str> = board.capabilities.iter().map(String::as_str).collect();
    println!("capabilities: {}", caps.join(", "));
    if !board.defaults.is_empty() {
        println!("defaults:");
        for (key, value) in &board.defaults {
            println!("  {key} = {}", serde_json::to_string(value)?);
        }
    }
    Ok(0)
}

fn board_line(board: &CapabilityDescriptor) -> String {
    let caps: Vec<&str> = board.capabilities.iter().map(String::as_str).collect();
    format!("{:<24} {:<8} {}", board.name, board.vendor.as_str(), caps.join(","))
}
