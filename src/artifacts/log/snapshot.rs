//! Effective file map of a commit
//!
//! A commit only lists the files staged for it. Its full snapshot is those
//! files layered over the snapshot of its first parent, recursively, with the
//! nearer commit winning when a path appears more than once.

use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: BTreeMap<PathBuf, IndexEntry>,
}

impl Snapshot {
    /// Build a snapshot from a first-parent walk, newest commit first
    pub fn from_history(
        history: impl IntoIterator<Item = Result<(ObjectId, Commit)>>,
    ) -> Result<Self> {
        let mut entries = BTreeMap::new();

        for item in history {
            let (_, commit) = item?;
            for entry in commit.files() {
                entries
                    .entry(entry.to_path_buf())
                    .or_insert_with(|| entry.clone());
            }
        }

        Ok(Snapshot { entries })
    }

    pub fn from_entries(entries: impl IntoIterator<Item = IndexEntry>) -> Self {
        Snapshot {
            entries: entries
                .into_iter()
                .map(|entry| (entry.to_path_buf(), entry))
                .collect(),
        }
    }

    pub fn get(&self, path: &Path) -> Option<&ObjectId> {
        self.entries.get(path).map(IndexEntry::oid)
    }

    pub fn entry(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.keys()
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
