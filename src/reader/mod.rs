//! Configuration readers
//!
//! Resolve a model's layered configuration into concrete values for one
//! key-value tuple.
//!
//! # Overview
//!
//! The reader module provides:
//! - `Configurator` - the resolved view every consumer talks to
//! - `Reader` - single-level resolution over the ancestor chain
//! - `MultiLevelReader` - composition of several strategies into nested tables
//!
//! Singular fields come from the first layer that defines them (most-derived
//! first). Collections are concatenated across layers, most-derived first.

mod multi_level;
mod single;

pub use multi_level::MultiLevelReader;
pub use single::{ChainEntry, Reader};

use crate::config::{ForeignKey, Index};
use crate::error::Result;
use crate::model::Model;
use crate::sql::Connection;
use crate::types::{KeyValue, KeyValues};

/// Resolved partitioning configuration of a model
pub trait Configurator: Send + Sync {
    /// The model being resolved
    fn model(&self) -> &Model;

    /// Attributes that make up a key-value tuple, in order
    fn on_fields(&self) -> Result<Vec<String>>;

    /// Schema holding the child tables
    fn schema_name(&self) -> Result<String>;

    /// Prefix prepended to every base name
    fn name_prefix(&self) -> Result<String>;

    /// Child table name without schema or prefix
    fn base_name(&self, key_values: &[KeyValue]) -> Result<String>;

    /// Child table name without schema
    fn part_name(&self, key_values: &[KeyValue]) -> Result<String>;

    /// Fully qualified child table name
    fn table_name(&self, key_values: &[KeyValue]) -> Result<String>;

    /// Alias used when selecting from the child table
    fn table_alias_name(&self, key_values: &[KeyValue]) -> Result<String>;

    /// Table the child inherits from
    fn parent_table_name(&self, key_values: &[KeyValue]) -> Result<String>;

    /// Schema of the table the child inherits from
    fn parent_table_schema_name(&self, key_values: &[KeyValue]) -> Result<String>;

    /// CHECK constraint body of the child table
    fn check_constraint(&self, key_values: &[KeyValue]) -> Result<String>;

    /// Indexes for the child table, most-derived first, duplicates kept
    fn indexes(&self, key_values: &[KeyValue]) -> Result<Vec<Index>>;

    /// Foreign keys for the child table, without duplicates
    fn foreign_keys(&self, key_values: &[KeyValue]) -> Result<Vec<ForeignKey>>;

    /// ORDER BY clause for listing child tables, if any layer sets one
    fn last_partitions_order_by_clause(&self) -> Result<Option<String>>;

    /// Key values whose child tables should be created ahead of need
    fn janitorial_creates_needed(&self) -> Result<Vec<KeyValues>>;

    /// Key values whose child tables should be detached from the parent
    fn janitorial_archives_needed(&self) -> Result<Vec<KeyValues>>;

    /// Key values whose child tables have expired
    fn janitorial_drops_needed(&self) -> Result<Vec<KeyValues>>;

    /// Run every after-create hook for a new child table
    fn run_after_partition_table_create_hooks(
        &self,
        key_values: &[KeyValue],
        connection: &dyn Connection,
    ) -> Result<()>;
}
