//! Repository operations
//!
//! Commands are `impl Repository` blocks, one module per command, split the
//! way git splits them:
//!
//! - `plumbing`: direct object access (hash-object, cat-file, ls-files)
//! - `porcelain`: version control workflows (add, commit, log, branch, ...)
//!
//! Commands return structured results and never print; rendering belongs to
//! the binary.

pub mod plumbing;
pub mod porcelain;
