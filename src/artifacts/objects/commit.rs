//! Commit object
//!
//! Commits are immutable snapshots. Each one records:
//! - A timestamp (float seconds since the Unix epoch)
//! - Zero, one or two parent commits (root, normal, merge)
//! - The flat list of files staged for it, as `(digest, path)` pairs
//! - A message
//!
//! ## Format
//!
//! On disk (`.stow/objects/<digest>`):
//! ```text
//! timestamp <seconds>
//! parent <parent-digest>
//! file <blob-digest> <path>
//!
//! <commit message>
//! ```
//!
//! Field order is fixed, so serializing the same commit twice yields the same
//! bytes and therefore the same digest.

use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use bytes::Bytes;
use std::cmp::Ordering;

/// Most parents a commit may carry (two for a merge commit)
pub const MAX_PARENTS: usize = 2;

/// Seconds since the Unix epoch, with sub-second precision
///
/// Ordering uses IEEE total ordering so timestamps can key priority queues.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp(f64);

impl Timestamp {
    pub fn new(seconds: f64) -> Self {
        Timestamp(seconds)
    }

    pub fn now() -> Self {
        chrono::Utc::now().into()
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }

    /// Format as "Mon Jan 1 12:34:56 2024 +0000" in local time
    pub fn readable(&self) -> String {
        let seconds = self.0.floor();
        let nanos = ((self.0 - seconds) * 1e9) as u32;

        chrono::DateTime::from_timestamp(seconds as i64, nanos)
            .map(|datetime| {
                datetime
                    .with_timezone(&chrono::Local)
                    .format("%a %b %-d %H:%M:%S %Y %z")
                    .to_string()
            })
            .unwrap_or_else(|| self.0.to_string())
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Timestamp {
    fn from(datetime: chrono::DateTime<chrono::Utc>) -> Self {
        Timestamp(datetime.timestamp_micros() as f64 / 1_000_000.0)
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // shortest representation that parses back to the same f64
        write!(f, "{}", self.0)
    }
}

/// Slim representation of a commit
///
/// Carries only what graph traversal needs (identity, parents, time), so the
/// common-ancestor search never holds file lists in memory.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SlimCommit {
    pub oid: ObjectId,
    pub parents: Vec<ObjectId>,
    pub timestamp: Timestamp,
}

impl PartialOrd for SlimCommit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SlimCommit {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.oid.cmp(&other.oid))
    }
}

/// Commit object
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Parent commit IDs (empty for the root commit, two for a merge commit)
    parents: Vec<ObjectId>,
    timestamp: Timestamp,
    /// Files recorded by this commit, in index order
    files: Vec<IndexEntry>,
    message: String,
}

impl Commit {
    pub fn new(
        parents: Vec<ObjectId>,
        timestamp: Timestamp,
        files: Vec<IndexEntry>,
        message: String,
    ) -> Self {
        Commit {
            parents,
            timestamp,
            files,
            message,
        }
    }

    /// First line of the message, for one-line displays
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn files(&self) -> &[IndexEntry] {
        &self.files
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    /// The mainline parent
    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn to_slim(&self, oid: ObjectId) -> SlimCommit {
        SlimCommit {
            oid,
            parents: self.parents.clone(),
            timestamp: self.timestamp,
        }
    }

    fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("timestamp {}", self.timestamp)];

        for parent in &self.parents {
            lines.push(format!("parent {parent}"));
        }
        for entry in &self.files {
            lines.push(format!("file {} {}", entry.oid(), entry.as_str()));
        }

        lines
    }
}

impl Packable for Commit {
    fn serialize(&self) -> Result<Bytes> {
        let mut content = self.header_lines().join("\n");
        content.push_str("\n\n");
        content.push_str(&self.message);

        Ok(Bytes::from(content))
    }
}

impl Unpackable for Commit {
    fn deserialize(oid: &ObjectId, data: &[u8]) -> Result<Self> {
        let malformed = |reason: &str| Error::MalformedObject {
            oid: oid.clone(),
            reason: reason.to_string(),
        };

        let content = std::str::from_utf8(data).map_err(|_| malformed("not valid UTF-8"))?;
        let (header, message) = content
            .split_once("\n\n")
            .ok_or_else(|| malformed("missing header terminator"))?;
        let mut lines = header.lines().peekable();

        let timestamp = lines
            .next()
            .and_then(|line| line.strip_prefix("timestamp "))
            .ok_or_else(|| malformed("missing timestamp line"))?
            .parse::<f64>()
            .ok()
            .filter(|seconds| seconds.is_finite())
            .map(Timestamp::new)
            .ok_or_else(|| malformed("invalid timestamp"))?;

        // there can be 0, 1 or 2 parent lines
        let mut parents = Vec::new();
        while let Some(parent) = lines.peek().and_then(|line| line.strip_prefix("parent ")) {
            if parents.len() == MAX_PARENTS {
                return Err(malformed("too many parents"));
            }
            parents.push(ObjectId::try_parse(parent).map_err(|_| malformed("invalid parent"))?);
            lines.next();
        }

        let mut files = Vec::new();
        for line in lines {
            let (file_oid, path) = line
                .strip_prefix("file ")
                .and_then(|rest| rest.split_once(' '))
                .ok_or_else(|| malformed("invalid file line"))?;
            let file_oid =
                ObjectId::try_parse(file_oid).map_err(|_| malformed("invalid file digest"))?;

            files.push(IndexEntry::try_new(path, file_oid).map_err(|_| malformed("invalid path"))?);
        }

        Ok(Commit::new(parents, timestamp, files, message.to_string()))
    }
}

impl Object for Commit {}
