//! Shared foundational types used across the socgen workspace.
//!
//! This crate provides build fingerprints (the cache keys of generated
//! netlists), content checksums for cached artifacts, clock frequency
//! values with unit parsing, and FPGA vendors.

#![warn(missing_docs)]

pub mod frequency;
pub mod hash;
pub mod vendor;

pub use frequency::{Frequency, ParseFrequencyError};
pub use hash::{ContentHash, Fingerprint, ParseFingerprintError};
pub use vendor::Vendor;
