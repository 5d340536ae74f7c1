//! YAML Loader module
//!
//! Parse partitioned table definitions from YAML files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `TablesDefinition` - Declarative list of partitioned tables
//! - `StrategyDefinition` - Which built-in strategy a table derives from
//! - YAML parsing with validation
//! - `build_model` - Turn a definition into a `Model`

mod build;
mod parser;
mod types;

pub use build::{build_model, build_model_on, build_models};
pub use parser::{load_tables, load_tables_from_str};
pub use types::{
    ForeignKeyDefinition, IndexDefinition, JanitorialDefinition, StrategyDefinition,
    TableDefinition, TablesDefinition,
};
