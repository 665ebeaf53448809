//! Plumbing commands (low-level operations)
//!
//! ## Commands
//!
//! - `hash-object`: Compute a file's digest and optionally store it
//! - `cat-file`: Print a stored object
//! - `ls-files`: List staged entries or a commit's snapshot

pub mod cat_file;
pub mod hash_object;
pub mod ls_files;
