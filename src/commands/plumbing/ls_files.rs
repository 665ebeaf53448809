use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::errors::Result;

impl Repository {
    /// Files recorded by a revision, snapshot union included, ordered by path
    pub fn list_commit_files(&self, revision: &str) -> Result<Vec<IndexEntry>> {
        let oid = self.resolve_revision(revision)?;

        Ok(self.snapshot(&oid)?.entries().cloned().collect())
    }
}
