use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, IoContext, Result};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the repository directory inside the working directory
pub const REPOSITORY_DIR: &str = ".stow";

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_ignored(path: &Path) -> bool {
        path.components().any(|component| {
            matches!(component, std::path::Component::Normal(name) if name == REPOSITORY_DIR)
        })
    }

    /// Turn a user-supplied path (absolute, or relative to the process working
    /// directory) into a path relative to the workspace root
    pub fn relative_path(&self, path: &Path) -> Result<PathBuf> {
        let absolute_path = match std::fs::canonicalize(path) {
            Ok(absolute_path) => absolute_path,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound(path.to_path_buf()));
            }
            Err(err) => return Err(err).io_context("unable to resolve", path),
        };

        let relative_path = absolute_path
            .strip_prefix(&self.path)
            .map_err(|_| Error::OutsideWorkspace(path.to_path_buf()))?;

        if Self::is_ignored(relative_path) {
            return Err(Error::OutsideWorkspace(path.to_path_buf()));
        }

        Ok(relative_path.to_path_buf())
    }

    /// Expand a path into the regular files beneath it, relative to the root
    pub fn list_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let relative_path = self.relative_path(path)?;
        let absolute_path = self.path.join(&relative_path);

        if !absolute_path.is_dir() {
            return Ok(vec![relative_path]);
        }

        let mut files = WalkDir::new(&absolute_path)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != REPOSITORY_DIR)
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.path)
                    .ok()
                    .map(Path::to_path_buf)
            })
            .collect::<Vec<_>>();
        files.sort();

        Ok(files)
    }

    /// Read the full content of a regular file
    ///
    /// Anything that is not a readable regular file is `FileNotFound`.
    pub fn read_file(&self, file_path: &Path) -> Result<Bytes> {
        let path = self.path.join(file_path);

        match std::fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => return Err(Error::FileNotFound(file_path.to_path_buf())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound(file_path.to_path_buf()));
            }
            Err(err) => return Err(err).io_context("unable to stat", path),
        }

        std::fs::read(&path)
            .map(Bytes::from)
            .io_context("unable to read", path)
    }

    /// Hash a file's current content and pair it with its path
    pub fn hash_file(&self, file_path: &Path) -> Result<(IndexEntry, Bytes)> {
        let content = self.read_file(file_path)?;
        let entry = IndexEntry::try_new(file_path, ObjectId::hash(&content))?;

        Ok((entry, content))
    }

    /// Write `content` to a workspace file, creating parent directories
    pub fn write_file(&self, file_path: &Path, content: &[u8]) -> Result<()> {
        let path = self.path.join(file_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).io_context("unable to create directory", parent)?;
        }

        std::fs::write(&path, content).io_context("unable to write", path)
    }
}
