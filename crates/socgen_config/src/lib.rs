//! Build configurations and `socgen.toml` project configuration.
//!
//! A [`BuildConfiguration`] is the complete set of options that affect a
//! generated netlist. [`canonicalize`] turns it into the order-independent
//! byte form that build fingerprints are computed from. The rest of the
//! crate parses and resolves the project configuration file.

#![warn(missing_docs)]

pub mod canonical;
pub mod error;
pub mod flags;
pub mod loader;
pub mod resolve;
pub mod types;
pub mod value;

pub use canonical::{canonical_string, canonicalize, fingerprint};
pub use error::ConfigError;
pub use flags::{flag_name, parse_flag_args};
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE};
pub use resolve::{resolve_soc, ResolvedSoc, SocOverrides};
pub use types::*;
pub use value::{BuildConfiguration, OptionValue, Scalar};
