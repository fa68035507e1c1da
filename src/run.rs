//! # Backup Run
//!
//! One complete, strictly sequential backup:
//!
//! 1. Resolve the destination to an absolute path and create it if needed.
//! 2. Load the repository listing from the API.
//! 3. Clone or update every repository, in listing order.
//! 4. Write the listing to `repos.json`, whatever the individual outcomes.
//!
//! Failing to list repositories, to create the destination, or to write the
//! snapshot aborts the run. Per-repository failures do not; they are counted
//! in the returned [`SyncReport`].

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::api::{ApiClient, RepositorySource, RetryPolicy, DEFAULT_API_BASE};
use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::repository::RepositoryDescriptor;
use crate::snapshot;
use crate::sync::{SyncOutcome, Synchronizer};

/// Settings for a single backup run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub credential: Credential,
    pub destination: PathBuf,
    pub api_base: String,
    pub retry: RetryPolicy,
    /// Follow pagination links when listing repositories.
    pub paginate: bool,
}

impl RunConfig {
    /// A configuration with the default API base, retry policy and
    /// pagination.
    pub fn new(credential: Credential, destination: impl Into<PathBuf>) -> Self {
        Self {
            credential,
            destination: destination.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            retry: RetryPolicy::default(),
            paginate: true,
        }
    }
}

/// Per-repository outcomes of a run, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    entries: Vec<(String, SyncOutcome)>,
}

impl SyncReport {
    pub fn record(&mut self, full_name: &str, outcome: SyncOutcome) {
        self.entries.push((full_name.to_string(), outcome));
    }

    pub fn entries(&self) -> &[(String, SyncOutcome)] {
        &self.entries
    }

    pub fn count(&self, outcome: SyncOutcome) -> usize {
        self.entries.iter().filter(|(_, o)| *o == outcome).count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(SyncOutcome::Failed) > 0
    }

    /// Names of the repositories that failed to sync.
    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, o)| *o == SyncOutcome::Failed)
            .map(|(name, _)| name.as_str())
    }

    /// `"N cloned, N updated, N failed"`
    pub fn summary(&self) -> String {
        format!(
            "{} cloned, {} updated, {} failed",
            self.count(SyncOutcome::Cloned),
            self.count(SyncOutcome::Updated),
            self.count(SyncOutcome::Failed)
        )
    }
}

/// Runs a backup against the GitHub API described by `config`.
pub fn execute(config: &RunConfig) -> Result<SyncReport> {
    let client = ApiClient::with_base(&config.credential, &config.api_base)?
        .with_retry_policy(config.retry)
        .with_pagination(config.paginate);
    let synchronizer = Synchronizer::new(config.credential.clone());

    execute_with(&config.destination, &client, &synchronizer)
}

/// Runs a backup into `destination` with explicit collaborators.
pub fn execute_with(
    destination: &Path,
    source: &dyn RepositorySource,
    synchronizer: &Synchronizer,
) -> Result<SyncReport> {
    let destination = prepare_destination(destination)?;

    info!("Loading list of repositories from Github...");
    let repos = source.list_repositories()?;

    let report = sync_all(&repos, &destination, synchronizer);

    snapshot::write_snapshot(&destination, &repos)?;
    info!("Wrote file: {}.", snapshot::SNAPSHOT_FILE_NAME);
    info!("Done: {}.", report.summary());

    Ok(report)
}

/// Synchronizes every repository in order and collects the outcomes.
pub fn sync_all(
    repos: &[RepositoryDescriptor],
    destination: &Path,
    synchronizer: &Synchronizer,
) -> SyncReport {
    let mut report = SyncReport::default();
    for repo in repos {
        let outcome = synchronizer.sync(repo, destination);
        report.record(repo.full_name(), outcome);
    }
    report
}

/// Makes `destination` absolute and creates it, with any missing parents.
pub fn prepare_destination(destination: &Path) -> Result<PathBuf> {
    let path = std::path::absolute(destination)?;

    if !path.exists() {
        fs::create_dir_all(&path)?;
        info!("Created directory: {}.", path.display());
    } else if !path.is_dir() {
        return Err(Error::Destination {
            path: path.display().to_string(),
            message: "not a directory".to_string(),
        });
    }

    Ok(path)
}
