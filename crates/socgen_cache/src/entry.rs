//! Sidecar records describing cached artifacts.
//!
//! Every artifact `<fp>.<ext>` has a sidecar `<fp>.json` written just before
//! the artifact is committed. Entries are never modified afterwards.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use socgen_common::{ContentHash, Fingerprint};

use crate::error::CacheError;

/// Extension of sidecar files.
pub const ENTRY_EXT: &str = "json";

/// Version of this tool, recorded in every entry.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Metadata for one cached artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Fingerprint of the build configuration.
    pub fingerprint: Fingerprint,
    /// Artifact file extension (`v`, `py`).
    pub extension: String,
    /// Canonical configuration the fingerprint was computed from.
    pub canonical: String,
    /// Human-readable name, e.g. the cluster name of the netlist.
    pub label: String,
    /// Checksum of the artifact bytes at commit time.
    pub checksum: ContentHash,
    /// Artifact size in bytes.
    pub size: u64,
    /// Creation time in seconds since the Unix epoch.
    pub created: u64,
    /// Version of the tool that created the entry.
    pub tool_version: String,
}

impl CacheEntry {
    /// Creates an entry for an artifact with the given contents.
    pub fn new(
        fingerprint: Fingerprint,
        extension: &str,
        canonical: String,
        label: &str,
        contents: &[u8],
    ) -> Self {
        Self {
            fingerprint,
            extension: extension.to_string(),
            canonical,
            label: label.to_string(),
            checksum: ContentHash::from_bytes(contents),
            size: contents.len() as u64,
            created: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            tool_version: TOOL_VERSION.to_string(),
        }
    }

    /// Path of the sidecar for `fingerprint` in `dir`.
    pub fn sidecar_path(dir: &Path, fingerprint: &Fingerprint) -> PathBuf {
        dir.join(format!("{fingerprint}.{ENTRY_EXT}"))
    }

    /// Path of the artifact this entry describes within `dir`.
    pub fn artifact_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.{}", self.fingerprint, self.extension))
    }

    /// Reads a sidecar file.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let content = std::fs::read_to_string(path).map_err(|e| CacheError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| CacheError::Entry {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Writes the sidecar to `path`.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Entry {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| CacheError::io(path, e))
    }
}
