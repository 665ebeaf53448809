//! Error types for repository operations
//!
//! Every failure the core can report is a variant of [`Error`]. Variants are
//! grouped into a small taxonomy ([`ErrorKind`]) so callers can decide how to
//! react without matching on every variant.

use crate::artifacts::objects::object_id::ObjectId;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An object, branch, file or repository is absent
    NotFound,
    /// Content does not match its digest
    Integrity,
    /// The repository is not in a state that allows the operation
    StateConflict,
    /// Persisted state or user input is malformed
    Structural,
    /// The underlying storage failed
    Io,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("not a stow repository (or any of the parent directories): {0}")]
    NotARepository(PathBuf),

    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("unknown branch: {0}")]
    UnknownBranch(String),

    #[error("unknown revision: {0}")]
    UnknownRevision(String),

    #[error("current branch has no commits yet")]
    NoCommits,

    #[error("staged file is missing from the working directory: {0}")]
    StagedFileMissing(PathBuf),

    #[error("staged file was modified after staging: {0}")]
    StagedFileModified(PathBuf),

    #[error("object {0} is corrupt: content does not match its digest")]
    CorruptObject(ObjectId),

    #[error("history is corrupt: commit {0} is missing from the object store")]
    CorruptHistory(ObjectId),

    #[error("history is corrupt: commit {0} is reachable from itself")]
    HistoryCycle(ObjectId),

    #[error("nothing to commit: the index is empty")]
    NothingToCommit,

    #[error("refusing to merge unrelated histories: no common ancestor")]
    NoCommonAncestor,

    #[error("repository already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("branch {0} already exists")]
    BranchExists(String),

    #[error("cannot delete branch {0}: it is checked out")]
    CurrentBranch(String),

    #[error("cannot checkout with staged changes: commit them first")]
    DirtyIndex,

    #[error("could not lock the repository within {0} ms")]
    LockUnavailable(u128),

    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("digest prefix {prefix} is ambiguous: {candidates:?}")]
    AmbiguousDigest {
        prefix: String,
        candidates: Vec<ObjectId>,
    },

    #[error("malformed HEAD: {0}")]
    MalformedHead(String),

    #[error("malformed ref {name}: {reason}")]
    MalformedRef { name: String, reason: String },

    #[error("malformed index at line {line}: {reason}")]
    MalformedIndex { line: usize, reason: String },

    #[error("malformed object {oid}: {reason}")]
    MalformedObject { oid: ObjectId, reason: String },

    #[error("path {0} is outside the working directory")]
    OutsideWorkspace(PathBuf),

    #[error("unsupported path {0}: paths must be relative valid UTF-8 without line breaks, outside the repository directory")]
    UnsupportedPath(PathBuf),

    #[error("invalid configuration {key}: {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotARepository(_)
            | Error::ObjectNotFound(_)
            | Error::FileNotFound(_)
            | Error::UnknownBranch(_)
            | Error::UnknownRevision(_)
            | Error::NoCommits
            | Error::StagedFileMissing(_) => ErrorKind::NotFound,
            Error::StagedFileModified(_)
            | Error::CorruptObject(_)
            | Error::CorruptHistory(_)
            | Error::HistoryCycle(_) => ErrorKind::Integrity,
            Error::NothingToCommit
            | Error::NoCommonAncestor
            | Error::AlreadyInitialized(_)
            | Error::BranchExists(_)
            | Error::CurrentBranch(_)
            | Error::DirtyIndex
            | Error::LockUnavailable(_) => ErrorKind::StateConflict,
            Error::InvalidBranchName(_)
            | Error::InvalidDigest(_)
            | Error::AmbiguousDigest { .. }
            | Error::MalformedHead(_)
            | Error::MalformedRef { .. }
            | Error::MalformedIndex { .. }
            | Error::MalformedObject { .. }
            | Error::OutsideWorkspace(_)
            | Error::UnsupportedPath(_)
            | Error::InvalidConfig { .. } => ErrorKind::Structural,
            Error::Io { .. } => ErrorKind::Io,
        }
    }
}

/// Attach the failing action and path to an `std::io::Error`
pub(crate) trait IoContext<T> {
    fn io_context(self, action: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context(self, action: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            action,
            path: path.into(),
            source,
        })
    }
}
