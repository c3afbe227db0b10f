//! The fingerprint cache: resolution, locked builds and maintenance.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rayon::prelude::*;
use socgen_common::{ContentHash, Fingerprint};
use socgen_config::{canonical_string, BuildConfiguration};

use crate::entry::{CacheEntry, ENTRY_EXT};
use crate::error::CacheError;
use crate::lock::LockGuard;

/// Prefix of per-build staging directories.
const STAGING_PREFIX: &str = ".staging-";

/// Extension of lock sentinels, appended to the artifact name.
const LOCK_EXT: &str = "lock";

/// Rewrites a staged artifact before it is committed.
pub type PostProcess = fn(&Path) -> std::io::Result<()>;

/// Result of resolving a configuration against the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Fingerprint of the configuration.
    pub fingerprint: Fingerprint,
    /// Whether a usable artifact already exists.
    pub cache_hit: bool,
    /// Where the artifact lives (or will live once built).
    pub artifact_path: PathBuf,
}

/// The private directory a producer writes into.
#[derive(Debug)]
pub struct Staging {
    dir: PathBuf,
    artifact: PathBuf,
    fingerprint: Fingerprint,
}

impl Staging {
    /// Directory the producer may write any files into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file the producer must create: `<staging>/<fingerprint>.<ext>`.
    pub fn artifact_path(&self) -> &Path {
        &self.artifact
    }

    /// Fingerprint being built; also the artifact's file stem.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Moves `file`, which the producer wrote under its own name, to
    /// [`artifact_path`](Self::artifact_path).
    ///
    /// A missing `file` is not an error here; the commit reports the
    /// missing artifact.
    pub fn adopt(&self, file: &Path) -> Result<(), CacheError> {
        if file == self.artifact || !file.is_file() {
            return Ok(());
        }
        std::fs::rename(file, &self.artifact).map_err(|e| CacheError::io(file, e))
    }
}

/// Removes the staging directory on every exit path.
struct StagingGuard(PathBuf);

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if self.0.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.0) {
                log::warn!("failed to remove staging directory {}: {e}", self.0.display());
            }
        }
    }
}

/// A problem found by [`FingerprintCache::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyIssue {
    /// A sidecar whose artifact is gone.
    MissingArtifact {
        /// The fingerprint of the entry.
        fingerprint: Fingerprint,
    },
    /// An artifact whose contents no longer match its sidecar.
    ChecksumMismatch {
        /// The fingerprint of the entry.
        fingerprint: Fingerprint,
        /// Checksum recorded at commit time.
        expected: ContentHash,
        /// Checksum of the current contents.
        actual: ContentHash,
    },
    /// An artifact without a sidecar.
    Orphan {
        /// The artifact path.
        path: PathBuf,
    },
    /// A sidecar that cannot be parsed.
    CorruptEntry {
        /// The sidecar path.
        path: PathBuf,
        /// The parse failure.
        reason: String,
    },
}

/// Outcome of [`FingerprintCache::verify`].
#[derive(Debug, Default)]
pub struct VerifyReport {
    /// Fingerprints of entries whose artifacts are intact.
    pub ok: Vec<Fingerprint>,
    /// Everything that is not intact.
    pub issues: Vec<VerifyIssue>,
}

impl VerifyReport {
    /// Returns `true` if no issues were found.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Deterministic, fingerprint-keyed cache of generated artifacts.
///
/// Artifacts are stored flat as `<dir>/<fingerprint>.<ext>`. One cache
/// instance handles one artifact kind; generators that share a directory
/// must use distinct extensions.
#[derive(Debug, Clone)]
pub struct FingerprintCache {
    dir: PathBuf,
    ext: String,
    force_rebuild: bool,
    lock_timeout: Duration,
    poll_interval: Duration,
    post_process: Option<PostProcess>,
}

impl FingerprintCache {
    /// Creates a cache for artifacts with extension `ext` under `dir`.
    ///
    /// The directory is created lazily by the first build.
    pub fn new(dir: impl Into<PathBuf>, ext: &str) -> Self {
        Self {
            dir: dir.into(),
            ext: ext.trim_start_matches('.').to_string(),
            force_rebuild: false,
            lock_timeout: Duration::from_secs(3600),
            poll_interval: Duration::from_millis(500),
            post_process: None,
        }
    }

    /// Treats every lookup as a miss and overwrites existing artifacts.
    pub fn force_rebuild(mut self, force: bool) -> Self {
        self.force_rebuild = force;
        self
    }

    /// Sets how long a build waits for a concurrent build of the same fingerprint.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Sets the lock polling interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Installs a hook that rewrites every staged artifact before commit.
    pub fn post_process(mut self, hook: PostProcess) -> Self {
        self.post_process = Some(hook);
        self
    }

    /// The cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The artifact extension, without a leading dot.
    pub fn extension(&self) -> &str {
        &self.ext
    }

    /// Path of the artifact for `fingerprint`.
    pub fn artifact_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{fingerprint}.{}", self.ext))
    }

    /// Computes the fingerprint of `config` and checks for an existing artifact.
    ///
    /// Has no side effects.
    pub fn resolve(&self, config: &BuildConfiguration) -> Result<Resolution, CacheError> {
        let canonical = canonical_string(config)?;
        Ok(self.resolve_canonical(&canonical))
    }

    fn resolve_canonical(&self, canonical: &str) -> Resolution {
        let fingerprint = Fingerprint::of(canonical.as_bytes());
        let artifact_path = self.artifact_path(&fingerprint);
        let cache_hit = !self.force_rebuild && artifact_path.is_file();
        log::debug!("canonical configuration: {canonical}");
        log::debug!(
            "fingerprint {fingerprint} -> {} ({})",
            artifact_path.display(),
            if cache_hit { "hit" } else { "miss" }
        );
        Resolution {
            fingerprint,
            cache_hit,
            artifact_path,
        }
    }

    /// Returns the artifact for `config`, running `producer` to create it on a miss.
    ///
    /// The producer receives a [`Staging`] area and must write
    /// [`Staging::artifact_path`]. The artifact only appears at its final
    /// path after the producer succeeded, the file exists and is non-empty,
    /// and the sidecar was written. A producer error is returned unchanged
    /// and leaves no cache entry behind.
    ///
    /// Concurrent builds of the same fingerprint are serialized by a lock
    /// file; a builder that waited reuses the artifact the holder produced.
    pub fn build<E, F>(
        &self,
        config: &BuildConfiguration,
        label: &str,
        producer: F,
    ) -> Result<Resolution, E>
    where
        F: FnOnce(&Staging) -> Result<(), E>,
        E: From<CacheError>,
    {
        let canonical = canonical_string(config).map_err(CacheError::from)?;
        let resolution = self.resolve_canonical(&canonical);
        if resolution.cache_hit {
            log::info!("netlist cache hit: {label} ({})", resolution.fingerprint);
            return Ok(resolution);
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;
        let lock_path = self.lock_path(&resolution.fingerprint);
        let (_lock, waited) =
            LockGuard::acquire(&lock_path, self.lock_timeout, self.poll_interval)?;
        if !self.force_rebuild && resolution.artifact_path.is_file() {
            if waited {
                log::info!("reusing netlist built concurrently: {label}");
            }
            return Ok(Resolution {
                cache_hit: true,
                ..resolution
            });
        }

        log::info!("netlist cache miss: {label} ({})", resolution.fingerprint);
        let staging_dir = self.dir.join(format!(
            "{STAGING_PREFIX}{}-{}",
            resolution.fingerprint,
            std::process::id()
        ));
        if staging_dir.exists() {
            std::fs::remove_dir_all(&staging_dir).map_err(|e| CacheError::io(&staging_dir, e))?;
        }
        std::fs::create_dir_all(&staging_dir).map_err(|e| CacheError::io(&staging_dir, e))?;
        let _staging_guard = StagingGuard(staging_dir.clone());
        let staging = Staging {
            artifact: staging_dir.join(format!("{}.{}", resolution.fingerprint, self.ext)),
            dir: staging_dir,
            fingerprint: resolution.fingerprint,
        };

        producer(&staging)?;
        self.commit(&staging, canonical, label, &resolution)?;
        Ok(resolution)
    }

    fn commit(
        &self,
        staging: &Staging,
        canonical: String,
        label: &str,
        resolution: &Resolution,
    ) -> Result<(), CacheError> {
        let staged = staging.artifact_path();
        let non_empty = std::fs::metadata(staged)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        if !non_empty {
            return Err(CacheError::MissingArtifact {
                path: staged.to_path_buf(),
            });
        }

        if let Some(hook) = self.post_process {
            hook(staged).map_err(|e| CacheError::io(staged, e))?;
        }

        let contents = std::fs::read(staged).map_err(|e| CacheError::io(staged, e))?;
        let entry = CacheEntry::new(
            resolution.fingerprint,
            &self.ext,
            canonical,
            label,
            &contents,
        );
        let staged_sidecar = staging
            .dir()
            .join(format!("{}.{ENTRY_EXT}", resolution.fingerprint));
        entry.save(&staged_sidecar)?;

        let sidecar = CacheEntry::sidecar_path(&self.dir, &resolution.fingerprint);
        std::fs::rename(&staged_sidecar, &sidecar).map_err(|e| CacheError::io(&sidecar, e))?;
        if let Err(e) = std::fs::rename(staged, &resolution.artifact_path) {
            // No sidecar may outlive a failed commit.
            if let Err(cleanup) = std::fs::remove_file(&sidecar) {
                log::warn!("failed to remove {}: {cleanup}", sidecar.display());
            }
            return Err(CacheError::io(&resolution.artifact_path, e));
        }
        log::debug!("committed {}", resolution.artifact_path.display());
        Ok(())
    }

    fn lock_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir
            .join(format!("{fingerprint}.{}.{LOCK_EXT}", self.ext))
    }

    /// Lists the sidecar entries for this cache's extension, sorted by creation time.
    ///
    /// Unreadable sidecars are skipped with a warning; [`verify`](Self::verify)
    /// reports them.
    pub fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        let mut entries = Vec::new();
        for path in self.sidecar_paths()? {
            match CacheEntry::load(&path) {
                Ok(entry) if entry.extension == self.ext => entries.push(entry),
                Ok(_) => {}
                Err(e) => log::warn!("{e}"),
            }
        }
        entries.sort_by(|a, b| {
            a.created
                .cmp(&b.created)
                .then_with(|| a.fingerprint.cmp(&b.fingerprint))
        });
        Ok(entries)
    }

    /// Recomputes artifact checksums and reports damaged or orphaned entries.
    pub fn verify(&self) -> Result<VerifyReport, CacheError> {
        let mut report = VerifyReport::default();
        let mut entries = Vec::new();
        for path in self.sidecar_paths()? {
            match CacheEntry::load(&path) {
                Ok(entry) if entry.extension == self.ext => entries.push(entry),
                Ok(_) => {}
                Err(e) => report.issues.push(VerifyIssue::CorruptEntry {
                    path,
                    reason: e.to_string(),
                }),
            }
        }

        let checked: Vec<Result<Fingerprint, VerifyIssue>> = entries
            .par_iter()
            .map(|entry| {
                let fingerprint = entry.fingerprint;
                let contents = std::fs::read(entry.artifact_path(&self.dir))
                    .map_err(|_| VerifyIssue::MissingArtifact { fingerprint })?;
                let actual = ContentHash::from_bytes(&contents);
                if actual == entry.checksum {
                    Ok(fingerprint)
                } else {
                    Err(VerifyIssue::ChecksumMismatch {
                        fingerprint,
                        expected: entry.checksum,
                        actual,
                    })
                }
            })
            .collect();
        for result in checked {
            match result {
                Ok(fp) => report.ok.push(fp),
                Err(issue) => report.issues.push(issue),
            }
        }

        for (path, fingerprint) in self.scan(&self.ext)? {
            if !CacheEntry::sidecar_path(&self.dir, &fingerprint).exists() {
                report.issues.push(VerifyIssue::Orphan { path });
            }
        }
        Ok(report)
    }

    /// Removes every artifact, sidecar, lock and staging directory of this cache.
    ///
    /// Files that are not named after a fingerprint are left alone. Returns
    /// the number of entries removed.
    pub fn clear(&self) -> Result<usize, CacheError> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        let read = std::fs::read_dir(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;
        for dirent in read {
            let dirent = dirent.map_err(|e| CacheError::io(&self.dir, e))?;
            let path = dirent.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with(STAGING_PREFIX) && path.is_dir() {
                std::fs::remove_dir_all(&path).map_err(|e| CacheError::io(&path, e))?;
                removed += 1;
            } else if is_cache_file(name) && path.is_file() {
                std::fs::remove_file(&path).map_err(|e| CacheError::io(&path, e))?;
                removed += 1;
            }
        }
        log::info!("removed {removed} cache files from {}", self.dir.display());
        Ok(removed)
    }

    fn sidecar_paths(&self) -> Result<Vec<PathBuf>, CacheError> {
        Ok(self
            .scan(ENTRY_EXT)?
            .into_iter()
            .map(|(path, _)| path)
            .collect())
    }

    /// Files `<fingerprint>.<ext>` directly inside the cache directory.
    fn scan(&self, ext: &str) -> Result<Vec<(PathBuf, Fingerprint)>, CacheError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        let read = std::fs::read_dir(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;
        for dirent in read {
            let dirent = dirent.map_err(|e| CacheError::io(&self.dir, e))?;
            let path = dirent.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ext) || !path.is_file() {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            if let Ok(fp) = stem.parse::<Fingerprint>() {
                found.push((path, fp));
            }
        }
        found.sort();
        Ok(found)
    }
}

/// `<fingerprint>.<anything>`, including `<fingerprint>.<ext>.lock`.
fn is_cache_file(name: &str) -> bool {
    name.split_once('.')
        .map(|(stem, _)| stem.parse::<Fingerprint>().is_ok())
        .unwrap_or(false)
}
