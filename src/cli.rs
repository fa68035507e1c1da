//! CLI argument parsing and run dispatch

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::builder::NonEmptyStringValueParser;
use clap::Parser;

use github_backup::api::{
    RetryPolicy, DEFAULT_API_BASE, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY,
};
use github_backup::credential::Credential;
use github_backup::output::{clock_time, OutputConfig};
use github_backup::run::{self, RunConfig};

/// Clones all of your GitHub repos (or updates them if they exist).
#[derive(Parser, Debug)]
#[command(name = "github-backup")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// A GitHub OAuth token with the `repo` permission
    #[arg(
        value_name = "TOKEN",
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        value_parser = NonEmptyStringValueParser::new()
    )]
    token: String,

    /// Destination directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    dest: PathBuf,

    /// Base URL of the GitHub API
    #[arg(long, value_name = "URL", env = "GITHUB_API_URL", default_value = DEFAULT_API_BASE)]
    api_url: String,

    /// Number of attempts for each API request
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    retries: u32,

    /// Seconds to wait between attempts of a failed API request
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_RETRY_DELAY.as_secs())]
    retry_delay: u64,

    /// Only fetch the first page of the repository listing
    #[arg(long)]
    first_page_only: bool,

    /// Exit with a non-zero status if any repository failed to sync
    #[arg(long)]
    strict: bool,

    /// Colorize output (always, never, auto)
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace); timestamps are UTC
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Execute the backup
    pub fn execute(self) -> Result<()> {
        self.init_logging()?;

        let config = RunConfig {
            credential: Credential::new(self.token),
            destination: self.dest,
            api_base: self.api_url,
            retry: RetryPolicy {
                max_attempts: self.retries,
                delay: Duration::from_secs(self.retry_delay),
            },
            paginate: !self.first_page_only,
        };

        let report = run::execute(&config).context("Backup aborted")?;

        if self.strict && report.has_failures() {
            let failed: Vec<&str> = report.failed().collect();
            anyhow::bail!(
                "{} repositories failed to sync: {}",
                failed.len(),
                failed.join(", ")
            );
        }

        Ok(())
    }

    /// Routes `log` records to stderr as `[hh:mm:ss] message`, in UTC.
    ///
    /// `RUST_LOG` takes precedence over `--log-level`.
    fn init_logging(&self) -> Result<()> {
        let output = OutputConfig::from_env_and_flag(&self.color);

        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.log_level.as_str()),
        )
        .write_style(output.write_style())
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            let timestamp = buf.timestamp_seconds().to_string();
            writeln!(
                buf,
                "{style}[{}]{style:#} {}",
                clock_time(&timestamp),
                record.args()
            )
        })
        .try_init()
        .context("Failed to initialize logging")
    }
}
