//! Object identifier (SHA-1 digest)
//!
//! Object IDs are 40-character lowercase hexadecimal strings. They identify
//! every object in the store and name the file it lives in:
//! `.stow/objects/<digest>`.

use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::errors::{Error, Result};
use sha1::{Digest, Sha1};

/// SHA-1 digest of an object's bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID
    ///
    /// Uppercase hex digits are accepted and normalized to lowercase.
    pub fn try_parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();

        if id.len() != OBJECT_ID_LENGTH || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidDigest(id));
        }

        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Compute the digest of a byte sequence
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);

        Self(format!("{:x}", hasher.finalize()))
    }

    /// Check whether `data` hashes to this digest
    pub fn matches(&self, data: &[u8]) -> bool {
        Self::hash(data) == *self
    }

    /// First 7 characters, the conventional abbreviation
    pub fn to_short_oid(&self) -> String {
        self.0[..7].to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
