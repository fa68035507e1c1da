//! # GitHub REST Client
//!
//! A minimal blocking client for the parts of the GitHub REST API the backup
//! uses. It is modelled on the handful of things every request needs:
//!
//! - **URL resolution**: relative resource paths are prefixed with the API
//!   base (`https://api.github.com/` unless overridden), and query
//!   parameters are appended only when there are any.
//! - **Headers**: every request carries `Authorization: token <token>` and an
//!   `Accept` header pinning the v3 JSON media type.
//! - **Retry**: a request is attempted up to `max_attempts` times with a
//!   fixed delay between attempts. Exhaustion is reported as
//!   [`Error::RetriesExhausted`]; the caller decides whether that is fatal.
//! - **Ordering**: response bodies are parsed into `serde_json::Value` with
//!   insertion order preserved, so re-serializing them does not shuffle keys.
//!
//! Listing endpoints are paginated with RFC 5988 `Link` headers. [`ApiClient::get_all`]
//! follows `rel="next"` links and concatenates the pages.

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, LINK};
use serde_json::Value;
use url::{form_urlencoded, Url};

use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::repository::RepositoryDescriptor;

/// Base URL of the public GitHub API.
pub const DEFAULT_API_BASE: &str = "https://api.github.com/";

/// Media type pinned on every request.
pub const ACCEPT_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// Number of attempts made for a single request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay between two attempts of the same request.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Resource listing the repositories of the authenticated user.
pub const USER_REPOS_PATH: &str = "user/repos";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Fixed-count retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// A source of repository descriptors.
///
/// The driver only depends on this trait, which lets tests feed it a fixed
/// listing without an HTTP server.
pub trait RepositorySource {
    /// Returns the repositories of the authenticated user, in API order.
    fn list_repositories(&self) -> Result<Vec<RepositoryDescriptor>>;
}

/// Authenticated GitHub API client.
///
/// Not `Debug`: it holds the `Authorization` header value.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base: String,
    auth_header: String,
    retry: RetryPolicy,
    paginate: bool,
}

impl ApiClient {
    /// Creates a client for the public GitHub API.
    pub fn new(credential: &Credential) -> Result<Self> {
        Self::with_base(credential, DEFAULT_API_BASE)
    }

    /// Creates a client for the API rooted at `base`, such as a GitHub
    /// Enterprise instance (`https://github.example.com/api/v3/`).
    pub fn with_base(credential: &Credential, base: &str) -> Result<Self> {
        let mut base = Url::parse(base)?.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            base,
            auth_header: credential.authorization_header(),
            retry: RetryPolicy::default(),
            paginate: true,
        })
    }

    /// Replaces the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Controls whether [`RepositorySource::list_repositories`] follows
    /// `rel="next"` links or stops after the first page.
    pub fn with_pagination(mut self, paginate: bool) -> Self {
        self.paginate = paginate;
        self
    }

    /// The normalized API base, always ending in `/`.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Builds the full request URL for `path` and `params`.
    ///
    /// `path` is used as-is when it already points below the API base.
    /// Parameters are form-encoded and joined with `&` when `path` already
    /// has a query string, `?` otherwise.
    pub fn resolve_url(&self, path: &str, params: &[(&str, &str)]) -> String {
        let mut url = if path.starts_with(&self.base) {
            path.to_string()
        } else {
            format!("{}{}", self.base, path)
        };

        if !params.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(params)
                .finish();
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }

        url
    }

    /// Fetches a single resource and parses it as JSON.
    pub fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.get_with_attempts(path, params, self.retry.max_attempts)
    }

    /// Like [`ApiClient::get`], with `max_attempts` in place of the client's
    /// retry policy for this one request. The policy's delay still applies.
    pub fn get_with_attempts(
        &self,
        path: &str,
        params: &[(&str, &str)],
        max_attempts: u32,
    ) -> Result<Value> {
        let url = self.resolve_url(path, params);
        let (value, _) = self.fetch_page(&url, max_attempts)?;
        Ok(value)
    }

    /// Fetches a paginated listing and returns the concatenated items.
    ///
    /// Every page must be a JSON array. Only `next` links below the API base
    /// are followed, so the token is never sent to another host. A link back
    /// to an already fetched page ends the listing.
    pub fn get_all(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<Value>> {
        let mut url = self.resolve_url(path, params);
        let mut visited = HashSet::new();
        let mut items = Vec::new();

        loop {
            let (page, next) = self.fetch_page(&url, self.retry.max_attempts)?;
            visited.insert(url.clone());
            match page {
                Value::Array(page_items) => items.extend(page_items),
                other => {
                    return Err(Error::UnexpectedPayload {
                        url,
                        message: format!("expected a JSON array, got {}", json_kind(&other)),
                    })
                }
            }

            match next {
                Some(next) if visited.contains(&next) => {
                    debug!("Pagination link {} was already fetched", next);
                    break;
                }
                Some(next) if next.starts_with(&self.base) => url = next,
                Some(next) => {
                    warn!("Not following pagination link outside the API: {}", next);
                    break;
                }
                None => break,
            }
        }

        Ok(items)
    }

    fn fetch_page(&self, url: &str, max_attempts: u32) -> Result<(Value, Option<String>)> {
        let response = self.send_with_retry(url, max_attempts)?;
        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_next_link);

        let body = response.text().map_err(|e| Error::UnexpectedPayload {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let value = serde_json::from_str(&body)?;
        Ok((value, next))
    }

    fn send_with_retry(&self, url: &str, max_attempts: u32) -> Result<Response> {
        let attempts = max_attempts.max(1);
        let mut last = None;

        for attempt in 1..=attempts {
            debug!("GET {} (attempt {}/{})", url, attempt, attempts);

            let result = self
                .client
                .get(url)
                .header(AUTHORIZATION, &self.auth_header)
                .header(ACCEPT, ACCEPT_MEDIA_TYPE)
                .send();

            match result {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let reason = status.canonical_reason().unwrap_or("Unknown Status");
                    warn!(
                        "Couldn't load URL: {} ({} {})",
                        url,
                        status.as_u16(),
                        reason
                    );
                    last = Some(format!("{} {}", status.as_u16(), reason));
                }
                Err(err) => {
                    warn!("Couldn't load URL: {} ({})", url, err);
                    last = Some(err.to_string());
                }
            }

            if attempt < attempts {
                thread::sleep(self.retry.delay);
                info!("Trying again...");
            }
        }

        Err(Error::RetriesExhausted {
            url: url.to_string(),
            attempts,
            last,
        })
    }
}

impl RepositorySource for ApiClient {
    fn list_repositories(&self) -> Result<Vec<RepositoryDescriptor>> {
        let items = if self.paginate {
            self.get_all(USER_REPOS_PATH, &[])?
        } else {
            match self.get(USER_REPOS_PATH, &[])? {
                Value::Array(items) => items,
                other => {
                    return Err(Error::UnexpectedPayload {
                        url: self.resolve_url(USER_REPOS_PATH, &[]),
                        message: format!("expected a JSON array, got {}", json_kind(&other)),
                    })
                }
            }
        };

        Ok(serde_json::from_value(Value::Array(items))?)
    }
}

/// Extracts the `rel="next"` target from a `Link` header value.
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| {
            let param = param.trim();
            param == r#"rel="next""# || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
