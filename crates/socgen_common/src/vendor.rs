//! FPGA vendors, which decide vendor-specific synthesis sources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The FPGA vendor of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// AMD/Xilinx (7-series, UltraScale, Spartan-6).
    Xilinx,
    /// Lattice (ECP5).
    Lattice,
    /// Intel/Altera (Cyclone).
    Intel,
    /// Efinix (Trion, Titanium).
    Efinix,
    /// Gowin (GW2A, GW5A).
    Gowin,
}

impl Vendor {
    /// All vendors, in display order.
    pub const ALL: [Vendor; 5] = [
        Vendor::Xilinx,
        Vendor::Lattice,
        Vendor::Intel,
        Vendor::Efinix,
        Vendor::Gowin,
    ];

    /// Lowercase vendor name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Xilinx => "xilinx",
            Vendor::Lattice => "lattice",
            Vendor::Intel => "intel",
            Vendor::Efinix => "efinix",
            Vendor::Gowin => "gowin",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xilinx" | "amd" => Ok(Vendor::Xilinx),
            "lattice" => Ok(Vendor::Lattice),
            "intel" | "altera" => Ok(Vendor::Intel),
            "efinix" => Ok(Vendor::Efinix),
            "gowin" => Ok(Vendor::Gowin),
            other => Err(format!("unknown vendor '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse() {
        for v in Vendor::ALL {
            assert_eq!(v.to_string().parse::<Vendor>().unwrap(), v);
        }
        assert_eq!("Altera".parse::<Vendor>().unwrap(), Vendor::Intel);
        assert!("actel".parse::<Vendor>().is_err());
    }

    #[test]
    fn serde_lowercase() {
        assert_eq!(serde_json::to_string(&Vendor::Gowin).unwrap(), "\"gowin\"");
    }
}
