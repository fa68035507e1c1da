//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a stub GitHub API server, local git remotes to clone
//! from, and a fixture that runs the `github-backup` binary against both.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new();
//!     let origin = fixture.origin("a");
//!     let server = ApiServer::start(vec![StubResponse::json(listing(&[("a", &origin)]))]);
//!     fixture.command(&server).assert().success();
//! }
//! ```

#![allow(dead_code)]

use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::thread;

use assert_fs::prelude::*;
use serde_json::{json, Value};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    pub use super::{listing, ApiServer, StubResponse, TestFixture, TOKEN};
}

/// Token passed to every CLI invocation.
pub const TOKEN: &str = "test-token";

/// A canned HTTP response.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub reason: &'static str,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StubResponse {
    /// A `200 OK` response with a JSON body.
    pub fn json(body: impl ToString) -> Self {
        Self {
            status: 200,
            reason: "OK",
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    /// An error response with a small JSON message body.
    pub fn error(status: u16, reason: &'static str) -> Self {
        Self {
            status,
            reason,
            headers: Vec::new(),
            body: json!({ "message": reason }).to_string(),
        }
    }

    /// Adds a response header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn render(&self) -> String {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
            self.status,
            self.reason,
            self.body.len()
        );
        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str("\r\n");
        head + &self.body
    }
}

/// A single-threaded HTTP server answering with canned responses.
///
/// The n-th connection gets the n-th response; once the list is exhausted the
/// last response is repeated. The head of every request is recorded.
pub struct ApiServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ApiServer {
    /// Starts a server with a fixed list of responses.
    pub fn start(responses: Vec<StubResponse>) -> Self {
        Self::start_with(|_| responses)
    }

    /// Starts a server whose responses may refer to its own base URL, for
    /// example in pagination `Link` headers.
    pub fn start_with(build: impl FnOnce(&str) -> Vec<StubResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind stub server");
        let base_url = format!("http://{}/", listener.local_addr().unwrap());
        let responses = build(&base_url);
        assert!(!responses.is_empty(), "stub server needs at least one response");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for (index, stream) in listener.incoming().enumerate() {
                let Ok(mut stream) = stream else { continue };
                let head = read_request_head(&mut stream);
                recorded.lock().unwrap().push(head);

                let response = &responses[index.min(responses.len() - 1)];
                let _ = stream.write_all(response.render().as_bytes());
                let _ = stream.flush();
            }
        });

        Self { base_url, requests }
    }

    /// The base URL to pass as `--api-url`, ending in `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request heads received so far, lowercased.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

fn read_request_head(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&head).to_ascii_lowercase()
}

/// Builds a `user/repos` style listing from `(name, clone_url)` pairs.
///
/// Each entry carries a few extra fields, in GitHub's order, so snapshot
/// tests can check that unknown fields survive untouched.
pub fn listing(repos: &[(&str, &str)]) -> Value {
    Value::Array(
        repos
            .iter()
            .enumerate()
            .map(|(id, (name, clone_url))| {
                json!({
                    "id": id + 1,
                    "node_id": format!("R_{}", id + 1),
                    "name": name,
                    "full_name": format!("u/{}", name),
                    "private": false,
                    "owner": { "login": "u" },
                    "clone_url": clone_url,
                    "default_branch": "main"
                })
            })
            .collect(),
    )
}

/// Runs git with a fixed identity and asserts success.
pub fn git(args: &[&str], dir: &Path) -> String {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=Test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A test fixture that provides a temporary directory holding local git
/// remotes and the backup destination.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The backup destination used by [`TestFixture::command`].
    pub fn dest(&self) -> PathBuf {
        self.path().join("out")
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Creates a bare remote `remotes/<name>.git` with one commit and returns
    /// its path as a string usable as a `clone_url`.
    pub fn origin(&self, name: &str) -> String {
        let remotes = self.path().join("remotes");
        let origin = remotes.join(format!("{}.git", name));
        let work = self.work_dir(name);
        fs::create_dir_all(&origin).unwrap();

        git(&["init", "--quiet", "--bare"], &origin);
        git(
            &["clone", "--quiet", origin.to_str().unwrap(), work.to_str().unwrap()],
            self.path(),
        );
        self.commit(name, "README.md", &format!("# {}\n", name));

        origin.to_string_lossy().into_owned()
    }

    /// Commits `file` with `content` to the remote created by
    /// [`TestFixture::origin`].
    pub fn commit(&self, name: &str, file: &str, content: &str) {
        let work = self.work_dir(name);
        fs::write(work.join(file), content).unwrap();
        git(&["add", file], &work);
        git(&["commit", "--quiet", "-m", &format!("add {}", file)], &work);
        git(&["push", "--quiet", "origin", "HEAD"], &work);
    }

    fn work_dir(&self, name: &str) -> PathBuf {
        self.path().join("work").join(name)
    }

    /// Create a command that backs up into [`TestFixture::dest`] using the
    /// stub API at `server`.
    pub fn command(&self, server: &ApiServer) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("github-backup");
        cmd.current_dir(self.path())
            .env_remove("RUST_LOG")
            .env_remove("GITHUB_TOKEN")
            .env_remove("GITHUB_API_URL")
            .arg(TOKEN)
            .arg("--dest")
            .arg("out")
            .arg("--api-url")
            .arg(server.base_url())
            .arg("--retry-delay")
            .arg("0")
            .arg("--color")
            .arg("never");
        cmd
    }

    /// Parses `<dest>/repos.json`.
    pub fn snapshot(&self) -> Value {
        let content = fs::read_to_string(self.dest().join("repos.json")).expect("repos.json");
        serde_json::from_str(&content).expect("repos.json is valid JSON")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_listing_shape() {
        let value = listing(&[("a", "https://host/u/a.git")]);
        assert_eq!(value[0]["full_name"], "u/a");
        assert_eq!(value[0]["clone_url"], "https://host/u/a.git");
    }

    #[test]
    fn test_stub_response_render() {
        let rendered = StubResponse::error(500, "Internal Server Error")
            .with_header("X-Test", "1")
            .render();
        assert!(rendered.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(rendered.contains("X-Test: 1\r\n"));
    }
}
