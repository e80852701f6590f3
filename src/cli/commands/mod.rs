//! Command implementations for the CLI.
//!
//! Each command group is implemented in its own module.

pub mod collections;
pub mod ingest;
pub mod init;
pub mod query;
