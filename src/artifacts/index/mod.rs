//! Index file format
//!
//! The index (staging area) records which file contents go into the next
//! commit. It is a plain text file, one entry per line:
//!
//! ```text
//! <path> <40-hex digest>
//! ```
//!
//! Paths are relative to the working directory root and use `/` separators.
//! Because the digest never contains a space, a path may contain spaces: the
//! digest is always the last space-separated field.

pub mod index_entry;
