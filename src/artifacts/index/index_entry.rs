//! Index entry representation
//!
//! Each entry pairs a working-directory path with the digest of the content
//! that was staged for it. The same type describes the files listed inside a
//! commit object.

use crate::areas::workspace::REPOSITORY_DIR;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// A staged file: path plus content digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexEntry {
    /// Path relative to the repository root, `/`-separated
    path: String,
    /// SHA-1 of the file content at stage time
    oid: ObjectId,
}

impl IndexEntry {
    /// Build an entry, validating the path
    ///
    /// The path must be relative, normalized (no `.` or `..` components), valid
    /// UTF-8 and free of line breaks, since the index and commit formats are
    /// line based. No component may name the repository directory.
    pub fn try_new(path: impl AsRef<Path>, oid: ObjectId) -> Result<Self> {
        let path = path.as_ref();
        let unsupported = || Error::UnsupportedPath(path.to_path_buf());

        let components = path
            .components()
            .map(|component| match component {
                Component::Normal(name) => name.to_str().ok_or_else(unsupported),
                _ => Err(unsupported()),
            })
            .collect::<Result<Vec<_>>>()?;

        if components.is_empty() || components.contains(&REPOSITORY_DIR) {
            return Err(unsupported());
        }

        let path = components.join("/");
        if path.contains(['\n', '\r']) {
            return Err(unsupported());
        }

        Ok(IndexEntry { path, oid })
    }

    /// Parse one line of the index file
    pub fn parse_line(line: &str, line_number: usize) -> Result<Self> {
        let malformed = |reason: &str| Error::MalformedIndex {
            line: line_number,
            reason: reason.to_string(),
        };

        let (path, oid) = line
            .rsplit_once(' ')
            .ok_or_else(|| malformed("expected `<path> <digest>`"))?;
        let oid = ObjectId::try_parse(oid).map_err(|err| malformed(&err.to_string()))?;

        Self::try_new(path, oid).map_err(|err| malformed(&err.to_string()))
    }

    /// Render as one line of the index file, without the newline
    pub fn to_line(&self) -> String {
        format!("{} {}", self.path, self.oid)
    }

    pub fn path(&self) -> &Path {
        Path::new(&self.path)
    }

    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }
}
