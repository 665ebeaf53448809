//! Core repository components
//!
//! This module contains the building blocks of a repository:
//!
//! - `database`: Content-addressed object store for commits and blobs
//! - `index`: Staging area tracking file contents for the next commit
//! - `lock`: Repository-wide exclusive lock for mutating operations
//! - `refs`: Branches and HEAD
//! - `repository`: High-level repository operations and coordination
//! - `workspace`: Working directory file system operations

pub mod database;
pub mod index;
pub mod lock;
pub mod refs;
pub mod repository;
pub mod workspace;

use crate::errors::{IoContext, Result};
use fake::rand;
use std::io::Write;
use std::path::Path;

/// Replace `path` with `content` so readers see either the old or the new file
///
/// The content goes to a temp file in the same directory which is then renamed
/// over the destination. On failure the temp file is removed.
pub(crate) fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir).io_context("unable to create directory", dir)?;

    let temp_path = dir.join(generate_temp_name());
    let written = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .and_then(|mut file| {
            file.write_all(content)?;
            file.sync_all()
        })
        .and_then(|_| std::fs::rename(&temp_path, path));

    if written.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }

    written.io_context("unable to write", path)
}

fn generate_temp_name() -> String {
    format!("tmp-{}", rand::random::<u32>())
}
