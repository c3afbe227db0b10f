//! Clock frequencies with unit parsing and display.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// A clock frequency stored in whole Hertz.
///
/// System clocks are always integral, so the value is kept as `u64`.
/// Parses strings like `"50MHz"`, `"100KHz"`, `"1.5GHz"`, scientific
/// notation such as `"150e6"`, and bare integers (interpreted as Hz).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Frequency(u64);

impl Frequency {
    /// Creates a frequency from a value in Hertz.
    pub const fn from_hz(hz: u64) -> Self {
        Self(hz)
    }

    /// Creates a frequency from a value in megahertz.
    pub const fn from_mhz(mhz: u64) -> Self {
        Self(mhz * 1_000_000)
    }

    /// Returns the frequency in Hertz.
    pub fn hz(&self) -> u64 {
        self.0
    }

    /// Returns the frequency in megahertz.
    pub fn mhz(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({self})")
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hz = self.0 as f64;
        if hz >= 1_000_000_000.0 {
            write!(f, "{}GHz", hz / 1_000_000_000.0)
        } else if hz >= 1_000_000.0 {
            write!(f, "{}MHz", hz / 1_000_000.0)
        } else if hz >= 1_000.0 {
            write!(f, "{}KHz", hz / 1_000.0)
        } else {
            write!(f, "{}Hz", self.0)
        }
    }
}

/// Error type for parsing frequency strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFrequencyError {
    /// The input string that failed to parse.
    pub input: String,
}

impl fmt::Display for ParseFrequencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid frequency: '{}'", self.input)
    }
}

impl std::error::Error for ParseFrequencyError {}

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseFrequencyError {
            input: s.to_string(),
        };

        let lower = s.to_ascii_lowercase();
        let (number, scale) = if let Some(num) = lower.strip_suffix("ghz") {
            (num, 1_000_000_000.0)
        } else if let Some(num) = lower.strip_suffix("mhz") {
            (num, 1_000_000.0)
        } else if let Some(num) = lower.strip_suffix("khz") {
            (num, 1_000.0)
        } else if let Some(num) = lower.strip_suffix("hz") {
            (num, 1.0)
        } else {
            (lower.as_str(), 1.0)
        };

        let val: f64 = number.trim().parse().map_err(|_| err())?;
        let hz = (val * scale).round();
        if !hz.is_finite() || hz <= 0.0 || hz > u64::MAX as f64 {
            return Err(err());
        }
        Ok(Frequency(hz as u64))
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(hz) => Ok(Frequency(hz)),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mhz() {
        let f: Frequency = "50MHz".parse().unwrap();
        assert_eq!(f.hz(), 50_000_000);
    }

    #[test]
    fn parse_fractional_ghz() {
        let f: Frequency = "1.5GHz".parse().unwrap();
        assert_eq!(f.hz(), 1_500_000_000);
    }

    #[test]
    fn parse_scientific() {
        let f: Frequency = "150e6".parse().unwrap();
        assert_eq!(f, Frequency::from_mhz(150));
    }

    #[test]
    fn parse_bare_number() {
        let f: Frequency = "25000000".parse().unwrap();
        assert_eq!(f.hz(), 25_000_000);
    }

    #[test]
    fn parse_case_insensitive() {
        let f: Frequency = "64mhz".parse().unwrap();
        assert_eq!(f, Frequency::from_mhz(64));
    }

    #[test]
    fn parse_rejects_garbage_and_zero() {
        assert!("fast".parse::<Frequency>().is_err());
        assert!("0MHz".parse::<Frequency>().is_err());
        assert!("-5MHz".parse::<Frequency>().is_err());
    }

    #[test]
    fn display_selects_best_unit() {
        assert_eq!(Frequency::from_mhz(300).to_string(), "300MHz");
        assert_eq!(Frequency::from_hz(115_200).to_string(), "115.2KHz");
        assert_eq!(Frequency::from_hz(500).to_string(), "500Hz");
    }

    #[test]
    fn deserialize_string_or_integer() {
        let a: Frequency = serde_json::from_str("\"100MHz\"").unwrap();
        let b: Frequency = serde_json::from_str("100000000").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<Frequency>("\"nope\"").is_err());
    }
}
