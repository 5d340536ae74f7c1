// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # Solidafy Partitioned
//!
//! Declarative table partitioning for PostgreSQL. A large logical table is
//! split into inherited child tables, each holding a disjoint key range;
//! their names, CHECK constraints, indexes and foreign keys are resolved from
//! a strategy chain and their DDL is generated and managed automatically.
//!
//! ## Features
//!
//! - **Strategies**: by id, by integer range, by foreign key, by time bucket
//!   (daily, weekly, monthly, yearly) and multi-level compositions
//! - **Override chain**: define a strategy once, override any setting per table
//! - **Lifecycle**: create, archive and drop child tables, with per-tuple
//!   failure isolation in batches
//! - **Routing**: map a record's attributes to the child table it belongs in
//! - **YAML definitions**: declare tables in a file and inspect them from the CLI
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use solidafy_partitioned::{strategy, InfrastructureOptions, KeyValue, PartitionManager};
//!
//! let employee = strategy::by_foreign_key().derive("Employee", |p| {
//!     p.model_table_name("employees").foreign_key_field("company_id");
//! })?;
//!
//! let manager = PartitionManager::new(employee, connection);
//! manager.create_infrastructure(&InfrastructureOptions::default())?;
//! manager.create_new_partition(&[KeyValue::Integer(1)])?;
//! // employees_partitions.p1 INHERITS (employees), CHECK ( company_id = 1 )
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            PartitionedTable (route records to children)         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │        PartitionManager (create / archive / drop, schema)       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │       SqlAdapter (DDL text)  →  Connection (execute/select)     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴──────────────┬───────────────────┐
//! │    Model     │          Reader              │     Strategy      │
//! ├──────────────┼──────────────────────────────┼───────────────────┤
//! │ Layer chain  │ single level: first wins,    │ PartitionedBase   │
//! │ Contract     │   collections concatenate    │ ByIntegerField    │
//! │ Data + Dsl   │ multi level: per-level keys  │ ByTimeField       │
//! │              │                              │ MultiLevel        │
//! └──────────────┴──────────────────────────────┴───────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Key values, table references and common aliases
pub mod types;

/// Template interpolation for configured settings
pub mod template;

/// Per-layer configuration data and the builder
pub mod config;

/// Strategy chains
pub mod model;

/// Built-in partitioning strategies
pub mod strategy;

/// Configuration resolution
pub mod reader;

/// DDL generation and the database connection
pub mod sql;

/// Child table lifecycle
pub mod manager;

/// Record routing
pub mod partitioned;

/// YAML loader for table definitions
pub mod loader;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{Dsl, ForeignKey, Index, IndexOptions, Setting};
pub use loader::{build_model, load_tables, load_tables_from_str, TablesDefinition};
pub use manager::{BatchReport, InfrastructureOptions, PartitionManager};
pub use model::Model;
pub use partitioned::{PartitionedTable, Route};
pub use reader::{Configurator, MultiLevelReader, Reader};
pub use sql::{Connection, MemoryConnection, SqlAdapter};
pub use strategy::TimeBucket;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
