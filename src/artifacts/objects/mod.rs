//! Object types and operations
//!
//! Everything the object store holds is addressed by the SHA-1 digest of its
//! serialized bytes. Two kinds of objects are written:
//!
//! - **Blob**: raw file content, byte for byte
//! - **Commit**: snapshot metadata (message, timestamp, parents, file list)
//!
//! Objects implement [`object::Packable`] for their canonical serialization and
//! [`object::Unpackable`] to read it back.

pub mod blob;
pub mod commit;
pub mod object;
pub mod object_id;

/// Length of a SHA-1 digest in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;

/// Shortest digest prefix accepted when resolving abbreviated digests
pub const MIN_PREFIX_LENGTH: usize = 4;
