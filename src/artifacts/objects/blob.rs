//! Blob object
//!
//! Blobs hold the exact bytes of a committed file. They carry no header, so a
//! blob's digest is the digest of the file itself and matches the digest
//! recorded in the index at stage time.

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use bytes::Bytes;
use derive_new::new;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Blob {
    content: Bytes,
}

impl Blob {
    pub fn content(&self) -> &Bytes {
        &self.content
    }
}

impl Packable for Blob {
    fn serialize(&self) -> Result<Bytes> {
        Ok(self.content.clone())
    }
}

impl Unpackable for Blob {
    fn deserialize(_oid: &ObjectId, data: &[u8]) -> Result<Self> {
        Ok(Blob::new(Bytes::copy_from_slice(data)))
    }
}

impl Object for Blob {}
