//! # Repository Synchronization
//!
//! Brings one local working copy in line with its remote:
//!
//! - If `<destination>/<name>` is an existing directory, it is updated with
//!   `git pull` from the authorized URL.
//! - If it does not exist, the repository is cloned from the authorized URL
//!   and the `origin` remote is immediately reset to the plain `clone_url`,
//!   so the token never stays in `.git/config`.
//! - Any git failure is logged and reported as [`SyncOutcome::Failed`]; it
//!   never aborts the run.
//!
//! All paths are absolute and derived from the destination root, so one
//! repository's sync cannot affect where the next one happens.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::git::{DefaultGitOperations, GitOperations};
use crate::repository::RepositoryDescriptor;

/// Name of the remote created by `git clone`.
pub const DEFAULT_REMOTE: &str = "origin";

/// Result of synchronizing a single repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncOutcome {
    Cloned,
    Updated,
    Failed,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncOutcome::Cloned => "cloned",
            SyncOutcome::Updated => "updated",
            SyncOutcome::Failed => "failed",
        })
    }
}

/// Embeds the credential in a transfer URL, right after `://`.
///
/// `https://host/u/a.git` becomes `https://<token>@host/u/a.git`. URLs without
/// a scheme separator (local paths) are returned unchanged.
pub fn authorized_url(clone_url: &str, credential: &Credential) -> String {
    match clone_url.split_once("://") {
        Some((scheme, rest)) => format!("{}://{}@{}", scheme, credential.expose(), rest),
        None => clone_url.to_string(),
    }
}

/// Clones or updates repositories below a destination root.
pub struct Synchronizer {
    git_ops: Box<dyn GitOperations>,
    credential: Credential,
}

impl Synchronizer {
    /// Creates a synchronizer that runs the system `git`.
    pub fn new(credential: Credential) -> Self {
        Self::with_operations(Box::new(DefaultGitOperations), credential)
    }

    /// Creates a synchronizer with a custom `GitOperations` implementation.
    pub fn with_operations(git_ops: Box<dyn GitOperations>, credential: Credential) -> Self {
        Self {
            git_ops,
            credential,
        }
    }

    /// The local working copy path for `repo`.
    pub fn target_path(destination_root: &Path, repo: &RepositoryDescriptor) -> PathBuf {
        destination_root.join(repo.name())
    }

    /// Clones or updates `repo` below `destination_root`.
    ///
    /// Failures are logged here; the caller only sees the outcome.
    pub fn sync(&self, repo: &RepositoryDescriptor, destination_root: &Path) -> SyncOutcome {
        match self.try_sync(repo, destination_root) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    "An error occurred trying to update {}: {}",
                    repo.full_name(),
                    self.credential.redact(&err.to_string())
                );
                SyncOutcome::Failed
            }
        }
    }

    fn try_sync(&self, repo: &RepositoryDescriptor, destination_root: &Path) -> Result<SyncOutcome> {
        let target = Self::target_path(destination_root, repo);
        let url = authorized_url(repo.clone_url(), &self.credential);

        if target.is_dir() {
            info!("Updating {}...", repo.full_name());
            self.git_ops.pull(&url, &target)?;
            return Ok(SyncOutcome::Updated);
        }

        if target.exists() {
            return Err(Error::Destination {
                path: target.display().to_string(),
                message: "exists but is not a directory".to_string(),
            });
        }

        info!("Cloning {}...", repo.full_name());
        self.git_ops.clone_repository(&url, &target)?;

        if let Err(err) = self
            .git_ops
            .set_remote_url(&target, DEFAULT_REMOTE, repo.clone_url())
        {
            // The fresh clone still has the token in its remote URL.
            if let Err(cleanup) = fs::remove_dir_all(&target) {
                warn!(
                    "Could not remove {} after a failed remote reset: {}",
                    target.display(),
                    cleanup
                );
            }
            return Err(err);
        }

        Ok(SyncOutcome::Cloned)
    }
}
