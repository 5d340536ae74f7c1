//! CLI commands and argument parsing

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Solidafy partitioned tables CLI
#[derive(Parser, Debug)]
#[command(name = "solidafy-partitioned")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Table definitions file (YAML)
    #[arg(short, long, global = true, default_value = "partitioned.yaml")]
    pub tables: PathBuf,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and validate the table definitions
    Validate,

    /// Show resolved names and constraints for one set of key values
    Names {
        /// Model name or parent table
        #[arg(long)]
        table: String,

        /// Partition key value, outermost first (repeatable)
        #[arg(short, long = "key")]
        keys: Vec<String>,
    },

    /// Print the DDL that would create the infrastructure and partitions
    Plan {
        /// Model name or parent table
        #[arg(long)]
        table: String,

        /// Partition key value, outermost first (repeatable); defaults to
        /// the janitorial create schedule
        #[arg(short, long = "key")]
        keys: Vec<String>,

        /// Date the janitorial windows are computed from (default: today, UTC)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Show janitorial creates, archives and drops
    Schedule {
        /// Model name or parent table
        #[arg(long)]
        table: String,

        /// Date the janitorial windows are computed from (default: today, UTC)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Pretty,
}
