//! SoC parameters: base defaults, board defaults and project overrides.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use socgen_common::Frequency;
use socgen_config::{ConfigError, ResolvedSoc};
use socgen_cpu::AccessMode;

use crate::registry::CapabilityDescriptor;

/// A loosely typed SoC parameter, as found in board tables and
/// `[soc.params]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// An integer.
    Int(i64),
    /// A string.
    Str(String),
    /// A flag.
    Bool(bool),
}

impl ParamValue {
    /// Converts a `[soc.params]` entry. Only integers, strings and booleans
    /// are SoC parameters.
    pub fn from_toml(key: &str, value: &toml::Value) -> Result<Self, ConfigError> {
        match value {
            toml::Value::Integer(i) => Ok(ParamValue::Int(*i)),
            toml::Value::String(s) => Ok(ParamValue::Str(s.clone())),
            toml::Value::Boolean(b) => Ok(ParamValue::Bool(*b)),
            other => Err(ConfigError::UnsupportedValue {
                key: key.to_string(),
                found: format!("{} {other}", other.type_str()),
            }),
        }
    }
}

/// The base defaults every board starts from.
pub const BASE_DEFAULTS: &[(&str, i64)] = &[
    ("integrated_rom_size", 0x10000),
    ("integrated_sram_size", 0x1800),
    ("l2_size", 0),
];

/// Every SoC parameter, resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocParams {
    /// Main bus protocol: `wishbone`, `axi-lite` or `axi`.
    pub bus_standard: String,
    /// Main bus data width in bits.
    pub bus_data_width: u32,
    /// Main bus address width in bits.
    pub bus_address_width: u32,
    /// CPU registry name.
    pub cpu_type: String,
    /// Requested CPU variant.
    pub cpu_variant: Option<String>,
    /// Explicit reset address; only honoured without an integrated ROM.
    pub cpu_reset_address: Option<u64>,
    /// CFU source.
    pub cpu_cfu: Option<PathBuf>,
    /// CXU sources.
    pub cxus: Vec<PathBuf>,
    /// Integrated ROM size in bytes; 0 disables the ROM.
    pub integrated_rom_size: u64,
    /// Integrated ROM access mode.
    pub integrated_rom_mode: String,
    /// Integrated SRAM size in bytes.
    pub integrated_sram_size: u64,
    /// Integrated main RAM size in bytes, for boards without DRAM.
    pub integrated_main_ram_size: u64,
    /// External SDRAM size in bytes, mapped as `main_ram` when non-zero.
    pub sdram_size: u64,
    /// CSR bus data width in bits.
    pub csr_data_width: u32,
    /// Add a UART.
    pub with_uart: bool,
    /// UART PHY: `serial`, `crossover`, `jtag_uart`, ...
    pub uart_name: String,
    /// UART baud rate.
    pub uart_baudrate: u32,
    /// Add a timer.
    pub with_timer: bool,
    /// Add an uptime counter to the timer.
    pub timer_uptime: bool,
    /// Add the SoC controller.
    pub with_ctrl: bool,
    /// Add a JTAG bridge.
    pub with_jtagbone: bool,
    /// JTAG chain of the bridge.
    pub jtagbone_chain: u32,
    /// Add a UART bridge.
    pub with_uartbone: bool,
    /// Add a watchdog.
    pub with_watchdog: bool,
    /// Watchdog counter width.
    pub watchdog_width: u32,
    /// Identifier string; empty for none.
    pub ident: String,
    /// Append the build time to the identifier.
    pub ident_version: bool,
    /// L2 cache size in bytes.
    pub l2_size: u64,
    /// System clock.
    pub sys_clk_freq: Frequency,
    /// Board target arguments without a SoC-level meaning (FPGA device
    /// variant, memory type selection, ...), passed through as is.
    pub target: BTreeMap<String, ParamValue>,
}

impl Default for SocParams {
    fn default() -> Self {
        Self {
            bus_standard: "wishbone".to_string(),
            bus_data_width: 32,
            bus_address_width: 32,
            cpu_type: "vexriscv_smp".to_string(),
            cpu_variant: None,
            cpu_reset_address: None,
            cpu_cfu: None,
            cxus: Vec::new(),
            integrated_rom_size: 0,
            integrated_rom_mode: "rx".to_string(),
            integrated_sram_size: 0x2000,
            integrated_main_ram_size: 0,
            sdram_size: 0,
            csr_data_width: 32,
            with_uart: true,
            uart_name: "serial".to_string(),
            uart_baudrate: 115_200,
            with_timer: true,
            timer_uptime: false,
            with_ctrl: true,
            with_jtagbone: false,
            jtagbone_chain: 1,
            with_uartbone: false,
            with_watchdog: false,
            watchdog_width: 32,
            ident: String::new(),
            ident_version: false,
            l2_size: 0,
            sys_clk_freq: Frequency::from_mhz(100),
            target: BTreeMap::new(),
        }
    }
}

impl SocParams {
    /// Resolves the parameters of `soc` on `board`.
    ///
    /// Later layers win: base defaults, then the board's defaults, then
    /// `[soc.params]`. A project parameter that is neither a SoC parameter
    /// nor one of the board's target arguments is rejected.
    pub fn resolve(board: &CapabilityDescriptor, soc: &ResolvedSoc) -> Result<Self, ConfigError> {
        let mut params = SocParams {
            cpu_type: soc.cpu.clone(),
            cpu_variant: soc.variant.clone(),
            cpu_cfu: soc.cfu.clone(),
            cxus: soc.cxus.clone(),
            ..SocParams::default()
        };
        for (key, value) in BASE_DEFAULTS {
            params.set(key, &ParamValue::Int(*value))?;
        }
        for (key, value) in &board.defaults {
            if !params.set(key, value)? {
                params.target.insert(key.clone(), value.clone());
            }
        }
        for (key, raw) in &soc.params {
            let value = ParamValue::from_toml(key, raw)?;
            if params.set(key, &value)? {
                continue;
            }
            match params.target.get(key) {
                Some(current) if same_kind(current, &value) => {
                    params.target.insert(key.clone(), value);
                }
                Some(current) => {
                    return Err(ConfigError::UnsupportedValue {
                        key: key.clone(),
                        found: format!("expected {}, found {value:?}", kind(current)),
                    });
                }
                None => {
                    return Err(ConfigError::ValidationError(format!(
                        "unknown SoC parameter '{key}' for board {}",
                        board.name
                    )));
                }
            }
        }
        params.validate()?;
        Ok(params)
    }

    /// Sets a SoC parameter. Returns `Ok(false)` when `key` is not one.
    pub fn set(&mut self, key: &str, value: &ParamValue) -> Result<bool, ConfigError> {
        match key {
            "bus_standard" => self.bus_standard = string(key, value)?,
            "bus_data_width" => self.bus_data_width = int(key, value)?,
            "bus_address_width" => self.bus_address_width = int(key, value)?,
            "cpu_reset_address" => self.cpu_reset_address = Some(int(key, value)?),
            "integrated_rom_size" => self.integrated_rom_size = int(key, value)?,
            "integrated_rom_mode" => self.integrated_rom_mode = string(key, value)?,
            "integrated_sram_size" => self.integrated_sram_size = int(key, value)?,
            "integrated_main_ram_size" => self.integrated_main_ram_size = int(key, value)?,
            "sdram_size" => self.sdram_size = int(key, value)?,
            "csr_data_width" => self.csr_data_width = int(key, value)?,
            "with_uart" => self.with_uart = flag(key, value)?,
            "uart_name" => self.uart_name = string(key, value)?,
            "uart_baudrate" => self.uart_baudrate = int(key, value)?,
            "with_timer" => self.with_timer = flag(key, value)?,
            "timer_uptime" => self.timer_uptime = flag(key, value)?,
            "with_ctrl" => self.with_ctrl = flag(key, value)?,
            "with_jtagbone" => self.with_jtagbone = flag(key, value)?,
            "jtagbone_chain" => self.jtagbone_chain = int(key, value)?,
            "with_uartbone" => self.with_uartbone = flag(key, value)?,
            "with_watchdog" => self.with_watchdog = flag(key, value)?,
            "watchdog_width" => self.watchdog_width = int(key, value)?,
            "ident" => self.ident = string(key, value)?,
            "ident_version" => self.ident_version = flag(key, value)?,
            "l2_size" => self.l2_size = int(key, value)?,
            "sys_clk_freq" => self.sys_clk_freq = frequency(key, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.bus_standard.as_str(), "wishbone" | "axi-lite" | "axi") {
            return Err(ConfigError::ValidationError(format!(
                "unsupported bus standard '{}' (expected wishbone, axi-lite or axi)",
                self.bus_standard
            )));
        }
        if !matches!(self.bus_data_width, 32 | 64 | 128 | 256 | 512) {
            return Err(ConfigError::ValidationError(format!(
                "unsupported bus data width {}",
                self.bus_data_width
            )));
        }
        if !matches!(self.csr_data_width, 8 | 16 | 32 | 64) {
            return Err(ConfigError::ValidationError(format!(
                "unsupported CSR data width {}",
                self.csr_data_width
            )));
        }
        self.integrated_rom_mode.parse::<AccessMode>()?;
        Ok(())
    }
}

fn kind(value: &ParamValue) -> &'static str {
    match value {
        ParamValue::Int(_) => "an integer",
        ParamValue::Str(_) => "a string",
        ParamValue::Bool(_) => "a boolean",
    }
}

fn same_kind(a: &ParamValue, b: &ParamValue) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

fn mismatch(key: &str, expected: &str, value: &ParamValue) -> ConfigError {
    ConfigError::UnsupportedValue {
        key: key.to_string(),
        found: format!("expected {expected}, found {value:?}"),
    }
}

fn int<T: TryFrom<i64>>(key: &str, value: &ParamValue) -> Result<T, ConfigError> {
    match value {
        ParamValue::Int(i) => T::try_from(*i).map_err(|_| ConfigError::UnsupportedValue {
            key: key.to_string(),
            found: format!("integer {i} out of range"),
        }),
        other => Err(mismatch(key, "an integer", other)),
    }
}

fn flag(key: &str, value: &ParamValue) -> Result<bool, ConfigError> {
    match value {
        ParamValue::Bool(b) => Ok(*b),
        other => Err(mismatch(key, "a boolean", other)),
    }
}

fn string(key: &str, value: &ParamValue) -> Result<String, ConfigError> {
    match value {
        ParamValue::Str(s) => Ok(s.clone()),
        other => Err(mismatch(key, "a string", other)),
    }
}

fn frequency(key: &str, value: &ParamValue) -> Result<Frequency, ConfigError> {
    match value {
        ParamValue::Int(hz) if *hz > 0 => Ok(Frequency::from_hz(*hz as u64)),
        ParamValue::Str(s) => s.parse().map_err(|e| ConfigError::UnsupportedValue {
            key: key.to_string(),
            found: format!("{e}"),
        }),
        other => Err(mismatch(key, "a frequency", other)),
    }
}
