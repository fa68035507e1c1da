//! The access token used for both API requests and git transfers.

use std::fmt;

/// An opaque bearer token.
///
/// The token is held in memory for the lifetime of a run and is never
/// written to disk. `Debug` output is redacted so the value cannot leak into
/// logs by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token. Only call this where the token must be sent.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// The value of the `Authorization` header for API requests.
    pub fn authorization_header(&self) -> String {
        format!("token {}", self.0)
    }

    /// Replaces every occurrence of the token in `text` with `***`.
    pub fn redact(&self, text: &str) -> String {
        if self.0.is_empty() {
            return text.to_string();
        }
        text.replace(&self.0, "***")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
