//! Generator source checkouts.

use std::path::PathBuf;

use crate::error::ProcessError;
use crate::process::{invoke, InvokeOptions};

/// Where a generator's sources come from and where they live locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    /// Git repository URL.
    pub repo: String,
    /// Branch to clone.
    pub branch: String,
    /// Local checkout directory.
    pub dir: PathBuf,
    /// Clone the repository when `dir` is missing.
    pub auto_clone: bool,
}

/// Makes sure the generator checkout exists.
///
/// An existing directory is used as is and never updated. A missing one is
/// cloned with `git clone --recursive -b <branch> <repo> <dir>` when
/// `auto_clone` is set; otherwise this fails with
/// [`ProcessError::MissingResource`].
pub fn git_checkout(checkout: &Checkout, options: &InvokeOptions) -> Result<(), ProcessError> {
    if checkout.dir.is_dir() {
        log::debug!("using generator checkout {}", checkout.dir.display());
        return Ok(());
    }
    if !checkout.auto_clone {
        return Err(ProcessError::MissingResource {
            path: checkout.dir.clone(),
            what: format!(
                "generator checkout (clone {} or set toolchain.auto_clone)",
                checkout.repo
            ),
        });
    }

    let parent = checkout
        .dir
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&parent).map_err(|source| ProcessError::Spawn {
        command: format!("mkdir {}", parent.display()),
        source,
    })?;

    log::info!("cloning {} ({}) into {}", checkout.repo, checkout.branch, checkout.dir.display());
    let command = vec![
        "git".to_string(),
        "clone".to_string(),
        "--recursive".to_string(),
        "-b".to_string(),
        checkout.branch.clone(),
        checkout.repo.clone(),
        checkout.dir.to_string_lossy().into_owned(),
    ];
    invoke(&command, &parent, options)
}
