//! # Repository Descriptors
//!
//! A `RepositoryDescriptor` is one entry of the `user/repos` listing. Only
//! the three fields the backup needs are typed:
//!
//! - `name`: the local directory name under the destination root.
//! - `full_name`: `owner/name`, used to identify the repository in logs.
//! - `clone_url`: the credential-free HTTPS transfer URL.
//!
//! Everything else the API returned is kept untouched in an ordered map, and
//! serialization writes that map back out. A descriptor therefore
//! re-serializes to exactly the object the API sent, with the same keys in
//! the same order, which is what the snapshot file relies on.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One repository as reported by the hosting API.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryDescriptor {
    name: String,
    full_name: String,
    clone_url: String,
    raw: Map<String, Value>,
}

impl RepositoryDescriptor {
    /// Builds a descriptor from a JSON object, keeping every field.
    ///
    /// Fails if `name`, `full_name` or `clone_url` is missing or not a string.
    pub fn from_map(raw: Map<String, Value>) -> serde_json::Result<Self> {
        #[derive(Deserialize)]
        struct Fields {
            name: String,
            full_name: String,
            clone_url: String,
        }

        let fields = Fields::deserialize(&Value::Object(raw.clone()))?;
        if matches!(fields.name.as_str(), "" | "." | "..") || fields.name.contains(['/', '\\']) {
            return Err(serde_json::Error::custom(format!(
                "repository name {:?} is not a valid directory name",
                fields.name
            )));
        }

        Ok(Self {
            name: fields.name,
            full_name: fields.full_name,
            clone_url: fields.clone_url,
            raw,
        })
    }

    /// The local directory name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `owner/name` identifier.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// The plain transfer URL, without credentials.
    pub fn clone_url(&self) -> &str {
        &self.clone_url
    }

    /// The complete object as returned by the API.
    pub fn as_json(&self) -> &Map<String, Value> {
        &self.raw
    }
}

impl Serialize for RepositoryDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RepositoryDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Map::deserialize(deserializer)?;
        Self::from_map(raw).map_err(D::Error::custom)
    }
}
