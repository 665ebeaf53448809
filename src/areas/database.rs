//! Content-addressed object store
//!
//! Objects live in `.stow/objects/<digest>`, one file per object. Writing an
//! object that already exists is a no-op, and every read re-hashes the bytes
//! so tampered or truncated objects are reported instead of returned.

use crate::areas::write_atomically;
use crate::artifacts::objects::commit::{Commit, SlimCommit};
use crate::artifacts::objects::object::{Object, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::{MIN_PREFIX_LENGTH, OBJECT_ID_LENGTH};
use crate::errors::{Error, IoContext, Result};
use bytes::Bytes;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    fn object_path(&self, object_id: &ObjectId) -> PathBuf {
        self.path.join(object_id.as_ref())
    }

    /// Hash `data` and write it under its digest unless it is already stored
    pub fn store(&self, data: &[u8]) -> Result<ObjectId> {
        let object_id = ObjectId::hash(data);
        let object_path = self.object_path(&object_id);

        // content addressing: an existing file already holds these exact bytes
        if !object_path.exists() {
            write_atomically(&object_path, data)?;
            tracing::debug!(oid = %object_id, size = data.len(), "object stored");
        }

        Ok(object_id)
    }

    pub fn store_object(&self, object: &impl Object) -> Result<ObjectId> {
        self.store(&object.serialize()?)
    }

    /// Read an object, checking that its bytes still match the digest
    pub fn load(&self, object_id: &ObjectId) -> Result<Bytes> {
        let object_path = self.object_path(object_id);

        let content = match std::fs::read(&object_path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ObjectNotFound(object_id.clone()));
            }
            Err(err) => return Err(err).io_context("unable to read object", object_path),
        };

        if !Self::verify(object_id, &content) {
            tracing::warn!(oid = %object_id, "object content does not match its digest");
            return Err(Error::CorruptObject(object_id.clone()));
        }

        Ok(content.into())
    }

    /// Check that `data` hashes to `object_id`
    pub fn verify(object_id: &ObjectId, data: &[u8]) -> bool {
        object_id.matches(data)
    }

    pub fn parse_object<T: Unpackable>(&self, object_id: &ObjectId) -> Result<T> {
        let content = self.load(object_id)?;

        T::deserialize(object_id, &content)
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> Result<Commit> {
        self.parse_object(object_id)
    }

    pub fn load_slim_commit(&self, object_id: &ObjectId) -> Result<SlimCommit> {
        Ok(self
            .parse_object_as_commit(object_id)?
            .to_slim(object_id.clone()))
    }

    /// Find all objects whose digest starts with the given prefix
    ///
    /// Used to resolve abbreviated digests typed by users. An empty result means
    /// no match; more than one match means the prefix is ambiguous.
    pub fn find_objects_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        let entries = std::fs::read_dir(&self.path).io_context("unable to list objects", &*self.path)?;

        let mut matches = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.len() == OBJECT_ID_LENGTH && name.starts_with(&prefix))
            .filter_map(|name| ObjectId::try_parse(name).ok())
            .collect::<Vec<_>>();
        matches.sort();

        Ok(matches)
    }

    /// Resolve a full digest or a unique prefix of at least four characters
    pub fn resolve_prefix(&self, prefix: &str) -> Result<Option<ObjectId>> {
        if prefix.len() < MIN_PREFIX_LENGTH || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(None);
        }

        let mut candidates = self.find_objects_by_prefix(prefix)?;
        match candidates.len() {
            0 => Ok(None),
            1 => Ok(candidates.pop()),
            _ => Err(Error::AmbiguousDigest {
                prefix: prefix.to_string(),
                candidates,
            }),
        }
    }
}
