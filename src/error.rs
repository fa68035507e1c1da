//! # Error Handling
//!
//! This module defines the centralized error type for the `github-backup`
//! library. It uses `thiserror` to derive an `Error` enum covering every
//! failure the fetch, sync and snapshot stages can produce.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Each variant carries enough context (URL,
//!   repository path, git subcommand) to produce a useful log line.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Errors are split by how the driver treats them:
//!
//! - `RetriesExhausted`, `UnexpectedPayload`, `Json` and `Destination` abort
//!   the whole run.
//! - `GitCommand` and per-repository `Io` errors are caught by the
//!   synchronizer, logged, and turned into a failed outcome.
//!
//! No variant ever holds the access token. Anything that may echo a URL with
//! embedded credentials (git's stderr) is scrubbed before it is logged.

use thiserror::Error;

/// Main error type for github-backup operations
#[derive(Error, Debug)]
pub enum Error {
    /// Every attempt to fetch a resource from the API failed.
    ///
    /// `last` describes the final failure (status line or transport error).
    #[error("Request to {url} failed after {attempts} attempt(s){}", last.as_ref().map(|l| format!(": {}", l)).unwrap_or_default())]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last: Option<String>,
    },

    /// The API answered successfully but with a payload of the wrong shape.
    #[error("Unexpected API response from {url}: {message}")]
    UnexpectedPayload { url: String, message: String },

    /// A `git` invocation failed or could not be started.
    #[error("Git {command} failed in {path}: {stderr}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    GitCommand {
        command: String,
        path: String,
        stderr: String,
        /// Optional hint for how to resolve the failure
        hint: Option<String>,
    },

    /// The destination root cannot be used.
    #[error("Invalid destination {path}: {message}")]
    Destination { path: String, message: String },

    /// An HTTP client error that is not tied to a single request attempt,
    /// such as failing to build the client.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON (de)serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
