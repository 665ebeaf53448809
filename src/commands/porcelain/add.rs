use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use std::path::{Path, PathBuf};

impl Repository {
    /// Stage a single regular file and return the digest of its content
    ///
    /// Only the index is written; the content itself is stored at commit time.
    pub async fn stage_file(&self, path: &Path) -> Result<ObjectId> {
        let _lock = self.lock_async().await?;
        let index = self.index();
        let mut index = index.lock().await;

        // Load the index file from the disk
        index.rehydrate()?;

        let relative_path = self.workspace().relative_path(path)?;
        let entry = self.stage_into(&mut index, &relative_path)?;

        index.write_updates()?;

        Ok(entry.oid().clone())
    }

    /// Stage files and directories; directories expand to the files beneath them
    ///
    /// Every path is resolved before anything is staged, so a missing path
    /// leaves the index untouched.
    pub async fn stage_paths(&self, paths: &[PathBuf]) -> Result<Vec<IndexEntry>> {
        let _lock = self.lock_async().await?;
        let index = self.index();
        let mut index = index.lock().await;

        index.rehydrate()?;

        let files = paths
            .iter()
            .map(|path| self.workspace().list_files(path))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        let entries = files
            .iter()
            .map(|file| self.stage_into(&mut index, file))
            .collect::<Result<Vec<_>>>()?;

        index.write_updates()?;

        Ok(entries)
    }

    fn stage_into(&self, index: &mut Index, relative_path: &Path) -> Result<IndexEntry> {
        let (entry, _) = self.workspace().hash_file(relative_path)?;
        tracing::debug!(path = entry.as_str(), oid = %entry.oid(), "staged");

        index.add(entry.clone());

        Ok(entry)
    }

    /// Entries currently in the index, ordered by path
    pub async fn staged_entries(&self) -> Result<Vec<IndexEntry>> {
        let index = self.index();
        let mut index = index.lock().await;

        index.rehydrate()?;

        Ok(index.entries().cloned().collect())
    }
}
