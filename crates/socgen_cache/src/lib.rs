//! Fingerprint-keyed on-disk cache for generated netlists.
//!
//! Each artifact lives at `<dir>/<fingerprint>.<ext>` next to a JSON sidecar
//! describing how it was produced. Artifacts are built in a private staging
//! directory and renamed into place only once complete, so a path that
//! exists in the cache always holds a whole artifact.

#![warn(missing_docs)]

pub mod cache;
pub mod entry;
pub mod error;
pub mod lock;

pub use cache::{FingerprintCache, PostProcess, Resolution, Staging, VerifyIssue, VerifyReport};
pub use entry::CacheEntry;
pub use error::CacheError;
