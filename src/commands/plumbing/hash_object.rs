use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use std::path::Path;

impl Repository {
    /// Digest of a working-directory file, stored as a blob when `write` is set
    pub fn hash_object(&self, path: &Path, write: bool) -> Result<ObjectId> {
        let relative_path = self.workspace().relative_path(path)?;
        let content = self.workspace().read_file(&relative_path)?;

        if !write {
            return Ok(ObjectId::hash(&content));
        }

        let _lock = self.lock()?;
        self.database().store(&content)
    }
}
