//! Data structures and algorithms
//!
//! - `branch`: Branch names and their ref paths
//! - `index`: Index (staging area) entries
//! - `log`: Commit history traversal and snapshots
//! - `merge`: Common ancestors and three-way resolution
//! - `objects`: Stored object types (blob, commit)

pub mod branch;
pub mod index;
pub mod log;
pub mod merge;
pub mod objects;
