//! A minimal content-addressed version-control engine
//!
//! - `areas`: on-disk state (object store, index, refs, workspace, lock)
//! - `artifacts`: the types and algorithms that state is made of
//! - `commands`: repository operations, one module per command
//! - `config`: runtime settings read from the environment
//! - `errors`: the error taxonomy shared by everything above

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod config;
pub mod errors;
