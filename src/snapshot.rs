//! The `repos.json` audit record.
//!
//! The snapshot is the repository listing exactly as the API reported it,
//! written once at the end of a run. It is not filtered by sync outcome.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::Result;
use crate::repository::RepositoryDescriptor;

/// File name of the snapshot, relative to the destination root.
pub const SNAPSHOT_FILE_NAME: &str = "repos.json";

/// Writes `repos` as a 4-space indented JSON array to
/// `<destination_root>/repos.json` and returns the file path.
pub fn write_snapshot(destination_root: &Path, repos: &[RepositoryDescriptor]) -> Result<PathBuf> {
    let path = destination_root.join(SNAPSHOT_FILE_NAME);

    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    repos.serialize(&mut serializer)?;
    buffer.write_all(b"\n")?;

    fs::write(&path, buffer)?;
    Ok(path)
}

/// Reads a snapshot written by [`write_snapshot`].
pub fn read_snapshot(path: &Path) -> Result<Vec<RepositoryDescriptor>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
