//! # GitHub Backup Library
//!
//! This library mirrors every repository of an authenticated GitHub user to
//! local disk. It is used by the `github-backup` command-line tool but can be
//! driven directly through [`run::execute`].
//!
//! ## Quick Example
//!
//! ```no_run
//! use github_backup::credential::Credential;
//! use github_backup::run::{self, RunConfig};
//!
//! let config = RunConfig::new(Credential::new("ghp_example"), "./backup");
//! let report = run::execute(&config)?;
//! println!("{}", report.summary());
//! # Ok::<(), github_backup::error::Error>(())
//! ```
//!
//! ## Core Concepts
//!
//! - **API client (`api`)**: Authenticated GET requests against the GitHub
//!   REST API with fixed-count retry and order-preserving JSON parsing.
//! - **Descriptors (`repository`)**: Typed access to `name`, `full_name` and
//!   `clone_url`, with every other field passed through untouched.
//! - **Synchronization (`sync`, `git`)**: Clone-or-pull per repository using
//!   the system `git`, with the token stripped from the stored remote.
//! - **Snapshot (`snapshot`)**: The listing written to `repos.json`.
//!
//! ## Execution Flow
//!
//! `run::execute` creates the destination, loads the listing, syncs each
//! repository in order, writes the snapshot and returns a per-repository
//! report. Only listing, destination and snapshot failures abort a run.

pub mod api;
pub mod credential;
pub mod error;
pub mod git;
pub mod output;
pub mod repository;
pub mod run;
pub mod snapshot;
pub mod sync;
