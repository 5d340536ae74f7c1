//! SQL adapter: resolved configuration in, DDL statements out

use super::connection::Connection;
use super::statements;
use crate::config::Index;
use crate::error::{sqlstate, Error, Result};
use crate::model::Model;
use crate::reader::Configurator;
use crate::strategy::{sanitize_identifier, split_qualified};
use crate::types::KeyValue;
use std::sync::Arc;
use tracing::{debug, info};

/// Issues partition DDL for one model over one connection
#[derive(Clone)]
pub struct SqlAdapter {
    model: Model,
    connection: Arc<dyn Connection>,
}

impl SqlAdapter {
    pub fn new(model: Model, connection: Arc<dyn Connection>) -> Self {
        Self { model, connection }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    pub fn configurator(&self) -> Box<dyn Configurator> {
        self.model.configurator()
    }

    fn execute(&self, statement: &str) -> Result<()> {
        debug!(model = self.model.name(), "Executing: {}", statement);
        self.connection.execute(statement)
    }

    fn select_values(&self, query: &str) -> Result<Vec<String>> {
        debug!(model = self.model.name(), "Querying: {}", query);
        self.connection.select_values(query)
    }

    fn count(&self, query: &str) -> Result<i64> {
        let values = self.select_values(query)?;
        let first = values.first().map_or("0", String::as_str);
        first
            .trim()
            .parse()
            .map_err(|_| Error::ddl(query, None, format!("expected a count, got '{first}'")))
    }

    // ========================================================================
    // Names
    // ========================================================================

    /// Fully qualified child table name
    pub fn partition_table_name(&self, key_values: &[KeyValue]) -> Result<String> {
        self.configurator().table_name(key_values)
    }

    /// Alias for the child table, restricted to `[A-Za-z0-9_]`
    pub fn partition_table_alias_name(&self, key_values: &[KeyValue]) -> Result<String> {
        Ok(sanitize_identifier(
            &self.configurator().table_alias_name(key_values)?,
        ))
    }

    // ========================================================================
    // Schema
    // ========================================================================

    pub fn create_partition_schema(&self, if_not_exists: bool) -> Result<()> {
        let schema = self.configurator().schema_name()?;
        self.execute(&statements::create_schema(&schema, if_not_exists))?;
        info!(model = self.model.name(), schema = %schema, "Created partition schema");
        Ok(())
    }

    /// Drop the child table schema; fails with `SchemaNotEmpty` when it still
    /// holds tables and `cascade` is off
    pub fn drop_partition_schema(&self, if_exists: bool, cascade: bool) -> Result<()> {
        let schema = self.configurator().schema_name()?;
        self.execute(&statements::drop_schema(&schema, if_exists, cascade))
            .map_err(|e| match e.sqlstate() {
                Some(sqlstate::DEPENDENT_OBJECTS_STILL_EXIST) => Error::SchemaNotEmpty {
                    schema: schema.clone(),
                },
                _ => e,
            })?;
        info!(model = self.model.name(), schema = %schema, cascade, "Dropped partition schema");
        Ok(())
    }

    pub fn partition_schema_exists(&self) -> Result<bool> {
        let schema = self.configurator().schema_name()?;
        Ok(self.count(&statements::schema_exists(&schema))? > 0)
    }

    // ========================================================================
    // Parent table rules
    // ========================================================================

    /// Install the function the parent insert rule calls
    pub fn ensure_always_fail_on_insert_exists(&self) -> Result<()> {
        self.execute(&statements::create_always_fail_function())
    }

    /// Make direct inserts into the parent table fail
    pub fn add_parent_table_rules(&self) -> Result<()> {
        let parent = self.configurator().parent_table_name(&[])?;
        self.ensure_always_fail_on_insert_exists()?;
        self.execute(&statements::create_insert_rule(&parent))
    }

    pub fn remove_parent_table_rules(&self) -> Result<()> {
        let parent = self.configurator().parent_table_name(&[])?;
        self.execute(&statements::drop_insert_rule(&parent))
    }

    // ========================================================================
    // Child tables
    // ========================================================================

    /// Check if the child table for `key_values` exists
    pub fn partition_exists(&self, key_values: &[KeyValue]) -> Result<bool> {
        let table = self.partition_table_name(key_values)?;
        let (schema, name) = split_qualified(&table);
        Ok(self.count(&statements::table_exists(schema, name))? > 0)
    }

    /// Names of the last `limit` child tables under the model's ordering
    pub fn last_n_partition_names(&self, limit: usize) -> Result<Vec<String>> {
        let configurator = self.configurator();
        let schema = configurator.schema_name()?;
        let order_by = configurator
            .last_partitions_order_by_clause()?
            .unwrap_or_else(|| statements::DEFAULT_ORDER_BY.to_string());
        self.select_values(&statements::list_partitions(&schema, &order_by, limit))
    }

    /// Create the child table inheriting from its parent, with its CHECK
    /// constraint
    pub fn create_partition_table(&self, key_values: &[KeyValue]) -> Result<()> {
        let configurator = self.configurator();
        let table = configurator.table_name(key_values)?;
        let check = configurator.check_constraint(key_values)?;
        let parent = configurator.parent_table_name(key_values)?;

        self.execute(&statements::create_table(&table, &check, &parent))
            .map_err(|e| match e.sqlstate() {
                Some(sqlstate::DUPLICATE_TABLE) => Error::PartitionAlreadyExists { table },
                _ => e,
            })
    }

    pub fn drop_partition_table(&self, key_values: &[KeyValue]) -> Result<()> {
        let table = self.partition_table_name(key_values)?;
        self.execute(&statements::drop_table(&table))
            .map_err(|e| missing_table(e, table))
    }

    /// Detach the child table from its parent, keeping its rows
    pub fn archive_partition_table(&self, key_values: &[KeyValue]) -> Result<()> {
        let configurator = self.configurator();
        let table = configurator.table_name(key_values)?;
        let parent = configurator.parent_table_name(key_values)?;
        self.execute(&statements::no_inherit(&table, &parent))
            .map_err(|e| missing_table(e, table))
    }

    /// Create the child table's indexes, one per distinct column list
    pub fn add_partition_table_index(&self, key_values: &[KeyValue]) -> Result<()> {
        let configurator = self.configurator();
        let table = configurator.table_name(key_values)?;
        let (_, part) = split_qualified(&table);

        for index in distinct_indexes(configurator.indexes(key_values)?) {
            self.execute(&statements::create_index(&table, part, &index))?;
        }
        Ok(())
    }

    /// Add the child table's foreign keys
    pub fn add_references_to_partition_table(&self, key_values: &[KeyValue]) -> Result<()> {
        let configurator = self.configurator();
        let table = configurator.table_name(key_values)?;
        let (_, part) = split_qualified(&table);

        for foreign_key in configurator.foreign_keys(key_values)? {
            self.execute(&statements::add_foreign_key(&table, part, &foreign_key))?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SqlAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlAdapter")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

fn missing_table(error: Error, table: String) -> Error {
    match error.sqlstate() {
        Some(sqlstate::UNDEFINED_TABLE) => Error::PartitionMissing { table },
        _ => error,
    }
}

/// Keep the first (most-derived) definition for each column list
fn distinct_indexes(indexes: Vec<Index>) -> Vec<Index> {
    let mut seen = Vec::new();
    let mut distinct = Vec::new();
    for index in indexes {
        let columns = index.columns();
        if !seen.contains(&columns) {
            seen.push(columns);
            distinct.push(index);
        }
    }
    distinct
}
