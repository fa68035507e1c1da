//! # GitHub Backup CLI
//!
//! This is the binary entry point for the `github-backup` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Setting up logging.
//! - Handing the run over to the `github_backup` library and turning its
//!   result into an exit status.

mod cli;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
