use crate::areas::repository::Repository;
use crate::artifacts::objects::blob::Blob;
use crate::errors::{Error, Result};

impl Repository {
    /// Raw bytes of any stored object, named by full digest or unique prefix
    pub fn cat_file(&self, digest: &str) -> Result<Blob> {
        let object_id = self
            .database()
            .resolve_prefix(digest)?
            .ok_or_else(|| Error::UnknownRevision(digest.to_string()))?;

        self.database().parse_object::<Blob>(&object_id)
    }
}
