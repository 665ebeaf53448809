//! Porcelain commands (user-facing operations)
//!
//! ## Commands
//!
//! - `init`: Initialize a new repository
//! - `add`: Stage files for commit
//! - `commit`: Create a new commit from the index
//! - `log`: Walk commit history and compute snapshots
//! - `branch`: Create, list, or delete branches
//! - `checkout`: Move HEAD and write a commit's files
//! - `merge`: Merge another branch into the current one

pub mod add;
pub mod branch;
pub mod checkout;
pub mod commit;
pub mod init;
pub mod log;
pub mod merge;
