//! Thin wrappers around the system `git` executable.
//!
//! Every call gets an explicit working directory; nothing here reads or
//! changes the process's current directory. `GIT_TERMINAL_PROMPT=0` keeps git
//! from blocking on a credential prompt when the embedded token is rejected.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use crate::error::{Error, Result};

/// Trait for git operations - allows mocking in tests
pub trait GitOperations {
    /// Clones `url` into `target_dir`, which must not exist yet.
    fn clone_repository(&self, url: &str, target_dir: &Path) -> Result<()>;

    /// Pulls `url` into the working copy at `repo_dir`.
    fn pull(&self, url: &str, repo_dir: &Path) -> Result<()>;

    /// Overwrites the URL of `remote` in the working copy at `repo_dir`.
    fn set_remote_url(&self, repo_dir: &Path, remote: &str, url: &str) -> Result<()>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn clone_repository(&self, url: &str, target_dir: &Path) -> Result<()> {
        clone_quiet(url, target_dir)
    }

    fn pull(&self, url: &str, repo_dir: &Path) -> Result<()> {
        pull_quiet(url, repo_dir)
    }

    fn set_remote_url(&self, repo_dir: &Path, remote: &str, url: &str) -> Result<()> {
        set_remote_url(repo_dir, remote, url)
    }
}

/// Runs `git clone <url> <target_dir> --quiet`.
pub fn clone_quiet(url: &str, target_dir: &Path) -> Result<()> {
    // Create parent directory if it doesn't exist
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut command = git(None);
    command.arg("clone").arg(url).arg(target_dir).arg("--quiet");
    run(command, "clone", target_dir).map(drop)
}

/// Runs `git pull <url> --quiet` inside `repo_dir`.
///
/// Git records the pull argv, URL included, as the reflog message unless
/// `GIT_REFLOG_ACTION` is set, so it is pinned to plain `pull`.
pub fn pull_quiet(url: &str, repo_dir: &Path) -> Result<()> {
    let mut command = git(Some(repo_dir));
    command
        .env("GIT_REFLOG_ACTION", "pull")
        .args(["pull", url, "--quiet"]);
    run(command, "pull", repo_dir).map(drop)
}

/// Runs `git remote set-url <remote> <url>` inside `repo_dir`.
pub fn set_remote_url(repo_dir: &Path, remote: &str, url: &str) -> Result<()> {
    let mut command = git(Some(repo_dir));
    command.args(["remote", "set-url", remote, url]);
    run(command, "remote set-url", repo_dir).map(drop)
}

/// Returns the configured URL of `remote` in `repo_dir`.
pub fn remote_url(repo_dir: &Path, remote: &str) -> Result<String> {
    let mut command = git(Some(repo_dir));
    command.args(["remote", "get-url", remote]);
    let output = run(command, "remote get-url", repo_dir)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn git(repo_dir: Option<&Path>) -> Command {
    let mut command = Command::new("git");
    command.env("GIT_TERMINAL_PROMPT", "0");
    if let Some(dir) = repo_dir {
        command.current_dir(dir);
        // Discovery must not climb above `dir` into an enclosing checkout.
        if let Some(parent) = dir.parent() {
            command.env("GIT_CEILING_DIRECTORIES", parent);
        }
    }
    command
}

fn run(mut command: Command, name: &str, path: &Path) -> Result<Output> {
    let output = command.output().map_err(|e| Error::GitCommand {
        command: name.to_string(),
        path: path.display().to_string(),
        stderr: e.to_string(),
        hint: Some("Make sure git is installed and on your PATH".to_string()),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let hint = auth_hint(&stderr);
        let stderr = if stderr.is_empty() {
            output.status.to_string()
        } else {
            stderr
        };

        return Err(Error::GitCommand {
            command: name.to_string(),
            path: path.display().to_string(),
            stderr,
            hint,
        });
    }

    Ok(output)
}

/// Provide helpful error message for common auth failures
fn auth_hint(stderr: &str) -> Option<String> {
    if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
        || stderr.contains("terminal prompts disabled")
    {
        Some("Make sure the token is valid and has the `repo` scope".to_string())
    } else {
        None
    }
}
