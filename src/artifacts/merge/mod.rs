//! Merge algorithms
//!
//! - `bca_finder`: best common ancestor of two commits
//! - `resolution`: file-level three-way classification against that ancestor

use crate::artifacts::objects::object_id::ObjectId;
use std::collections::BTreeSet;
use std::path::PathBuf;

pub mod bca_finder;
pub mod resolution;

/// What a merge did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The target is already part of the current history; nothing changed
    AlreadyUpToDate,
    /// The current ref moved forward to the target tip; no object was written
    FastForward(ObjectId),
    /// A merge commit was written and the current ref points at it
    Merged(ObjectId),
    /// Both sides changed these paths differently; nothing was written
    Conflicted(BTreeSet<PathBuf>),
}
