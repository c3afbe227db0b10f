//! `socgen cache list|verify|clear`.

use std::path::Path;

use socgen_cache::VerifyIssue;
use socgen_cpu::NetlistBuilder;

use crate::project::load_project;
use crate::{CacheAction, GlobalArgs};

/// Runs a cache operation on the project's cache directory.
pub fn run(action: CacheAction, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (project_dir, config) = load_project(global)?;
    let root = project_dir.join(&config.cache.dir);
    match action {
        CacheAction::List => list(&root),
        CacheAction::Verify => verify(&root, global),
        CacheAction::Clear => clear(&root, global),
    }
}

fn list(root: &Path) -> Result<i32, Box<dyn std::error::Error>> {
    for cache in NetlistBuilder::new(root).caches() {
        for entry in cache.entries()? {
            println!(
                "{} {:<3} {:>9} {}",
                entry.fingerprint,
                entry.extension,
                entry.size,
                entry.label
            );
        }
    }
    Ok(0)
}

fn verify(root: &Path, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut ok = 0;
    let mut issues = Vec::new();
    for cache in NetlistBuilder::new(root).caches() {
        let report = cache.verify()?;
        ok += report.ok.len();
        issues.extend(report.issues);
    }
    for issue in &issues {
        eprintln!("{}", describe(issue));
    }
    if !global.quiet {
        eprintln!("   {ok} intact, {} problem(s)", issues.len());
    }
    Ok(if issues.is_empty() { 0 } else { 1 })
}

fn clear(root: &Path, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut removed = 0;
    for cache in NetlistBuilder::new(root).caches() {
        removed += cache.clear()?;
    }
    if !global.quiet {
        eprintln!("   Removed {removed} cached artifact(s)");
    }
    Ok(0)
}

fn describe(issue: &VerifyIssue) -> String {
    match issue {
        VerifyIssue::MissingArtifact { fingerprint } => {
            format!("missing artifact: {fingerprint}")
        }
        VerifyIssue::ChecksumMismatch {
            fingerprint,
            expected,
            actual,
        } => format!("checksum mismatch: {fingerprint} (expected {expected}, found {actual})"),
        VerifyIssue::Orphan { path } => format!("orphaned artifact: {}", path.display()),
        VerifyIssue::CorruptEntry { path, reason } => {
            format!("corrupt entry {}: {reason}", path.display())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn issues_are_described() {
        let orphan = VerifyIssue::Orphan {
            path: PathBuf::from("/c/vexiiriscv/x.v"),
        };
        assert_eq!(describe(&orphan), "orphaned artifact: /c/vexiiriscv/x.v");
    }

    #[test]
    fn empty_cache_is_clean() {
        let tmp = tempfile::TempDir::new().unwrap();
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            config: None,
        };
        assert_eq!(list(tmp.path()).unwrap(), 0);
        assert_eq!(verify(tmp.path(), &global).unwrap(), 0);
        assert_eq!(clear(tmp.path(), &global).unwrap(), 0);
    }
}
