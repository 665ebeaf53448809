//! Staging area (index)
//!
//! The index records which file contents go into the next commit. It lives on
//! disk so `add` and `commit` can run as separate processes, and is always read
//! and written as a whole file.
//!
//! ## Data Structures
//!
//! - `entries`: staged entries keyed by path, so staging a path twice keeps
//!   only the latest digest and iteration order is stable

use crate::areas::write_atomically;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::errors::{IoContext, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (typically `.stow/index`)
    path: Box<Path>,
    entries: BTreeMap<PathBuf, IndexEntry>,
    /// Whether the in-memory entries differ from the file
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// Load the index from disk, replacing whatever is in memory
    ///
    /// A missing file is an empty index.
    pub fn rehydrate(&mut self) -> Result<()> {
        self.entries.clear();
        self.changed = false;

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err).io_context("unable to read index", &*self.path),
        };

        for (number, line) in content.lines().enumerate() {
            if line.is_empty() {
                continue;
            }

            let entry = IndexEntry::parse_line(line, number + 1)?;
            self.entries.insert(entry.to_path_buf(), entry);
        }

        Ok(())
    }

    /// Stage an entry, replacing any previous entry for the same path
    pub fn add(&mut self, entry: IndexEntry) {
        self.entries.insert(entry.to_path_buf(), entry);
        self.changed = true;
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.changed = true;
        }
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Persist the entries if anything changed since the last load or write
    pub fn write_updates(&mut self) -> Result<()> {
        if !self.changed {
            return Ok(());
        }

        let content = self
            .entries
            .values()
            .map(|entry| format!("{}\n", entry.to_line()))
            .collect::<String>();

        write_atomically(&self.path, content.as_bytes())?;
        self.changed = false;

        Ok(())
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }
}
