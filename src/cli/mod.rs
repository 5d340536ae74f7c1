//! CLI module
//!
//! Command-line interface for inspecting partitioned table definitions.
//!
//! # Commands
//!
//! - `validate` - Load and validate the table definitions
//! - `names` - Resolved names and constraints for key values
//! - `plan` - Dry-run DDL against the in-memory catalog
//! - `schedule` - Janitorial creates, archives and drops

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
