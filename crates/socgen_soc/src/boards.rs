//! The builtin board table.
//!
//! One entry per supported board. Capabilities name the optional features a
//! board's target can add; defaults are the board's own SoC parameters,
//! applied over the base defaults and under project overrides.

use serde::Serialize;
use socgen_common::Vendor;

/// A board default parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Param {
    /// An integer (sizes, clock frequencies in Hz, baud rates).
    Int(i64),
    /// A string.
    Str(&'static str),
    /// A flag.
    Bool(bool),
}

/// How a bitstream is loaded into the FPGA's volatile configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMethod {
    /// The platform's default programmer.
    Programmer,
    /// The platform programmer, addressing the given JTAG device index.
    ProgrammerDevice(u32),
    /// An external command; `{}` is replaced by the bitstream path.
    External(&'static [&'static str]),
}

impl LoadMethod {
    /// The external command for `bitstream`, if this board uses one.
    pub fn command(&self, bitstream: &str) -> Option<Vec<String>> {
        match self {
            LoadMethod::External(argv) => Some(
                argv.iter()
                    .map(|a| if *a == "{}" { bitstream.to_string() } else { a.to_string() })
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// How a bitstream is written to the board's configuration flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashMethod {
    /// The platform programmer, at offset 0.
    Programmer,
    /// The platform programmer, writing the `_fallback.bin` image.
    ProgrammerFallback,
}

impl FlashMethod {
    /// The image file actually flashed for `filename`.
    pub fn image(&self, filename: &str) -> String {
        match self {
            FlashMethod::Programmer => filename.to_string(),
            FlashMethod::ProgrammerFallback => filename.replace(".bin", "_fallback.bin"),
        }
    }
}

/// A builtin board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardSpec {
    /// Board name.
    pub name: &'static str,
    /// FPGA vendor.
    pub vendor: Vendor,
    /// Target module providing the board's platform.
    pub platform: &'static str,
    /// Optional features the board supports.
    pub capabilities: &'static [&'static str],
    /// Board-specific SoC parameters.
    pub defaults: &'static [(&'static str, Param)],
    /// Bitstream loading.
    pub load: LoadMethod,
    /// Flash programming.
    pub flash: FlashMethod,
}

/// Every supported board.
pub static BOARDS: &[BoardSpec] = &[
    BoardSpec {
        name: "acorn",
        vendor: Vendor::Xilinx,
        platform: "sqrl_acorn",
        capabilities: &["sata", "serial"],
        defaults: &[("uart_name", Param::Str("jtag_uart")), ("sys_clk_freq", Param::Int(150_000_000))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "acornpcie",
        vendor: Vendor::Xilinx,
        platform: "sqrl_acorn",
        capabilities: &["pcie", "serial"],
        defaults: &[("uart_name", Param::Str("crossover")), ("sys_clk_freq", Param::Int(125_000_000))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::ProgrammerFallback,
    },
    BoardSpec {
        name: "arty",
        vendor: Vendor::Xilinx,
        platform: "digilent_arty",
        capabilities: &["ethernet", "i2c", "leds", "rgb_led", "sdcard", "serial", "spi", "spiflash", "switches"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "artya7",
        vendor: Vendor::Xilinx,
        platform: "digilent_arty",
        capabilities: &["ethernet", "i2c", "leds", "rgb_led", "sdcard", "serial", "spi", "spiflash", "switches"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "artys7",
        vendor: Vendor::Xilinx,
        platform: "digilent_arty_s7",
        capabilities: &["i2c", "leds", "rgb_led", "serial", "spi", "spiflash", "switches"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "netv2",
        vendor: Vendor::Xilinx,
        platform: "kosagi_netv2",
        capabilities: &["ethernet", "framebuffer", "leds", "sdcard", "serial"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "genesys2",
        vendor: Vendor::Xilinx,
        platform: "digilent_genesys2",
        capabilities: &["ethernet", "sdcard", "usb_fifo"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "kc705",
        vendor: Vendor::Xilinx,
        platform: "xilinx_kc705",
        capabilities: &["ethernet", "leds", "sdcard", "serial"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "vc707",
        vendor: Vendor::Xilinx,
        platform: "xilinx_vc707",
        capabilities: &["ethernet", "leds", "sdcard", "serial"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "kcu105",
        vendor: Vendor::Xilinx,
        platform: "xilinx_kcu105",
        capabilities: &["ethernet", "sdcard", "serial"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "aesku40",
        vendor: Vendor::Xilinx,
        platform: "avnet_aesku40",
        capabilities: &["ethernet", "sdcard", "serial"],
        defaults: &[("uart_baudrate", Param::Int(115_200))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "zcu104",
        vendor: Vendor::Xilinx,
        platform: "xilinx_zcu104",
        capabilities: &["serial"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "nexys4ddr",
        vendor: Vendor::Xilinx,
        platform: "digilent_nexys4ddr",
        capabilities: &["ethernet", "framebuffer", "sdcard", "serial"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "nexysvideo",
        vendor: Vendor::Xilinx,
        platform: "digilent_nexys_video",
        capabilities: &["framebuffer", "sdcard", "usb_fifo"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "minispartan6",
        vendor: Vendor::Xilinx,
        platform: "scarabhardware_minispartan6",
        capabilities: &["framebuffer", "sdcard", "usb_fifo"],
        defaults: &[("l2_size", Param::Int(2048))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "pipistrello",
        vendor: Vendor::Xilinx,
        platform: "saanlima_pipistrello",
        capabilities: &["serial"],
        defaults: &[("l2_size", Param::Int(2048))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "xcu1525",
        vendor: Vendor::Xilinx,
        platform: "sqrl_xcu1525",
        capabilities: &["sata", "serial"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "alveou280",
        vendor: Vendor::Xilinx,
        platform: "xilinx_alveo_u280",
        capabilities: &["serial"],
        defaults: &[("with_hbm", Param::Bool(true)), ("sys_clk_freq", Param::Int(250_000_000))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "alveou250",
        vendor: Vendor::Xilinx,
        platform: "xilinx_alveo_u250",
        capabilities: &["serial"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "sds1104xe",
        vendor: Vendor::Xilinx,
        platform: "siglent_sds1104xe",
        capabilities: &["ethernet", "framebuffer", "serial"],
        defaults: &[("l2_size", Param::Int(8192))],
        load: LoadMethod::ProgrammerDevice(1),
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "qmtech_wukong",
        vendor: Vendor::Xilinx,
        platform: "qmtech_wukong",
        capabilities: &["ethernet", "framebuffer", "leds", "serial"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "mnt_rkx7",
        vendor: Vendor::Xilinx,
        platform: "mnt_rkx7",
        capabilities: &["serial", "spisdcard"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "stlv7325",
        vendor: Vendor::Xilinx,
        platform: "sitlinv_stlv7325_v1",
        capabilities: &["sdcard", "serial"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "stlv7325_v2",
        vendor: Vendor::Xilinx,
        platform: "sitlinv_stlv7325_v2",
        capabilities: &["sdcard", "serial"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "decklinkquadhdmirecorder",
        vendor: Vendor::Xilinx,
        platform: "decklink_quad_hdmi_recorder",
        capabilities: &["pcie", "serial"],
        defaults: &[("uart_name", Param::Str("crossover")), ("sys_clk_freq", Param::Int(125_000_000))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "hseda_xc7a35t",
        vendor: Vendor::Xilinx,
        platform: "hseda_xc7a35t",
        capabilities: &["serial"],
        defaults: &[("sys_clk_freq", Param::Int(80_000_000))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "versaecp5",
        vendor: Vendor::Lattice,
        platform: "lattice_versa_ecp5",
        capabilities: &["ethernet", "serial"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "ulx3s",
        vendor: Vendor::Lattice,
        platform: "radiona_ulx3s",
        capabilities: &["framebuffer", "sdcard", "serial"],
        defaults: &[("l2_size", Param::Int(2048))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "ulx4m_ld_v2",
        vendor: Vendor::Lattice,
        platform: "radiona_ulx4m_ld_v2",
        capabilities: &["framebuffer", "sdcard", "serial", "video_terminal"],
        defaults: &[("uart_name", Param::Str("serial")), ("sys_clk_freq", Param::Int(50_000_000)), ("l2_size", Param::Int(2048))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "hadbadge",
        vendor: Vendor::Lattice,
        platform: "hackaday_hadbadge",
        capabilities: &["serial"],
        defaults: &[("l2_size", Param::Int(2048))],
        load: LoadMethod::External(&["dfu-util", "--alt", "2", "--download", "{}", "--reset"]),
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "orangecrab",
        vendor: Vendor::Lattice,
        platform: "gsd_orangecrab",
        capabilities: &["i2c", "sdcard", "usb_acm"],
        defaults: &[("sys_clk_freq", Param::Int(64_000_000))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "butterstick",
        vendor: Vendor::Lattice,
        platform: "gsd_butterstick",
        capabilities: &["ethernet", "serial"],
        defaults: &[("uart_name", Param::Str("jtag_uart"))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "camlink4k",
        vendor: Vendor::Lattice,
        platform: "camlink_4k",
        capabilities: &["serial"],
        defaults: &[],
        load: LoadMethod::External(&["camlink", "configure", "{}"]),
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "trellissocboard",
        vendor: Vendor::Lattice,
        platform: "trellisboard",
        capabilities: &["sdcard", "serial"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "ecpix5",
        vendor: Vendor::Lattice,
        platform: "lambdaconcept_ecpix5",
        capabilities: &["ethernet", "sdcard", "serial"],
        defaults: &[],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "colorlight_i5",
        vendor: Vendor::Lattice,
        platform: "colorlight_i5",
        capabilities: &["ethernet", "serial"],
        defaults: &[("l2_size", Param::Int(2048))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "icesugarpro",
        vendor: Vendor::Lattice,
        platform: "muselab_icesugar_pro",
        capabilities: &["sdcard", "serial", "spiflash"],
        defaults: &[("l2_size", Param::Int(2048))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "schoko",
        vendor: Vendor::Lattice,
        platform: "machdyne_schoko",
        capabilities: &["framebuffer", "serial", "spiflash", "spisdcard", "usb_host"],
        defaults: &[("l2_size", Param::Int(8192))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "konfekt",
        vendor: Vendor::Lattice,
        platform: "machdyne_konfekt",
        capabilities: &["framebuffer", "serial", "spisdcard", "usb_host"],
        defaults: &[("l2_size", Param::Int(0))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "noir",
        vendor: Vendor::Lattice,
        platform: "machdyne_noir",
        capabilities: &["framebuffer", "serial", "spiflash", "spisdcard", "usb_host"],
        defaults: &[("l2_size", Param::Int(8192))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "de10nano",
        vendor: Vendor::Intel,
        platform: "terasic_de10nano",
        capabilities: &["leds", "sdcard", "serial", "switches"],
        defaults: &[("with_mister_sdram", Param::Bool(true)), ("l2_size", Param::Int(2048)), ("integrated_sram_size", Param::Int(0x1000))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "de0nano",
        vendor: Vendor::Intel,
        platform: "terasic_de0nano",
        capabilities: &["serial"],
        defaults: &[("l2_size", Param::Int(2048)), ("integrated_sram_size", Param::Int(0x1000))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "de1soc",
        vendor: Vendor::Intel,
        platform: "terasic_de1soc",
        capabilities: &["leds", "serial", "switches"],
        defaults: &[("l2_size", Param::Int(2048)), ("integrated_sram_size", Param::Int(0x1000))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "qmtech_ep4ce15",
        vendor: Vendor::Intel,
        platform: "qmtech_ep4cex5",
        capabilities: &["serial"],
        defaults: &[("variant", Param::Str("ep4ce15")), ("l2_size", Param::Int(2048)), ("integrated_sram_size", Param::Int(0x1000))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "qmtech_ep4ce55",
        vendor: Vendor::Intel,
        platform: "qmtech_ep4cex5",
        capabilities: &["serial"],
        defaults: &[("variant", Param::Str("ep4ce55")), ("l2_size", Param::Int(2048)), ("integrated_sram_size", Param::Int(0x1000))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "qmtech_5cefa2",
        vendor: Vendor::Intel,
        platform: "qmtech_5cefa2",
        capabilities: &["serial"],
        defaults: &[("variant", Param::Str("5cefa2")), ("l2_size", Param::Int(2048)), ("integrated_sram_size", Param::Int(0x1000))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "triont120bga576devkit",
        vendor: Vendor::Efinix,
        platform: "efinix_trion_t120_bga576_dev_kit",
        capabilities: &["leds", "serial"],
        defaults: &[("l2_size", Param::Int(2048))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "titaniumti60f225devkit",
        vendor: Vendor::Efinix,
        platform: "efinix_titanium_ti60_f225_dev_kit",
        capabilities: &["leds", "sdcard", "serial"],
        defaults: &[("with_hyperram", Param::Bool(true)), ("sys_clk_freq", Param::Int(300_000_000))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "sipeed_tang_nano_20k",
        vendor: Vendor::Gowin,
        platform: "sipeed_tang_nano_20k",
        capabilities: &["sdcard", "serial"],
        defaults: &[("l2_size", Param::Int(2048))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
    BoardSpec {
        name: "sipeed_tang_primer_20k",
        vendor: Vendor::Gowin,
        platform: "sipeed_tang_primer_20k",
        capabilities: &["serial", "spisdcard"],
        defaults: &[("l2_size", Param::Int(512))],
        load: LoadMethod::Programmer,
        flash: FlashMethod::Programmer,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn names_are_unique_and_lowercase() {
        let mut seen = BTreeSet::new();
        for board in BOARDS {
            assert!(seen.insert(board.name), "duplicate board {}", board.name);
            assert_eq!(board.name, board.name.to_lowercase());
        }
        assert_eq!(seen.len(), BOARDS.len());
    }

    #[test]
    fn every_vendor_is_represented() {
        for vendor in Vendor::ALL {
            assert!(
                BOARDS.iter().any(|b| b.vendor == vendor),
                "no {vendor} board"
            );
        }
    }

    #[test]
    fn every_board_declares_capabilities() {
        assert!(BOARDS.iter().all(|b| !b.capabilities.is_empty()));
    }

    #[test]
    fn external_loader_substitutes_bitstream() {
        let load = LoadMethod::External(&["dfu-util", "--download", "{}", "--reset"]);
        assert_eq!(
            load.command("top.bit").unwrap(),
            vec!["dfu-util", "--download", "top.bit", "--reset"]
        );
        assert_eq!(LoadMethod::Programmer.command("top.bit"), None);
    }

    #[test]
    fn fallback_flash_image() {
        assert_eq!(
            FlashMethod::ProgrammerFallback.image("build/top.bin"),
            "build/top_fallback.bin"
        );
        assert_eq!(FlashMethod::Programmer.image("top.bin"), "top.bin");
    }
}
