//! Commit history traversal
//!
//! - `rev_list`: lazy first-parent walk from a commit back to the root
//! - `snapshot`: effective file map of a commit, built from that walk
//!
//! Both walks stop at the first missing or repeated commit and report it,
//! so a damaged store can never make them loop or silently truncate.

use crate::artifacts::objects::commit::{Commit, Timestamp};
use crate::artifacts::objects::object_id::ObjectId;

pub mod rev_list;
pub mod snapshot;

/// One line of history as shown to users
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub oid: ObjectId,
    pub message: String,
    pub timestamp: Timestamp,
    pub parents: Vec<ObjectId>,
}

impl HistoryEntry {
    pub fn from_commit(oid: ObjectId, commit: &Commit) -> Self {
        HistoryEntry {
            oid,
            message: commit.message().to_string(),
            timestamp: commit.timestamp(),
            parents: commit.parents().to_vec(),
        }
    }

    pub fn short_message(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}
