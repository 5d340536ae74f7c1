//! Record routing for partitioned tables
//!
//! The ORM-facing side of a partitioned model: given a record's attributes,
//! work out its partition key values and the child table that should
//! receive the statement.

use crate::error::{Error, Result};
use crate::manager::PartitionManager;
use crate::model::Model;
use crate::reader::Configurator;
use crate::sql::Connection;
use crate::types::{JsonObject, KeyValue, KeyValues, TableRef};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

type TableCache = HashMap<(KeyValues, Option<String>), TableRef>;

/// Where a record should be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub key_values: KeyValues,
    pub table: TableRef,
}

/// A partitioned model bound to a database connection
#[derive(Debug, Clone)]
pub struct PartitionedTable {
    manager: PartitionManager,
    tables: Arc<RwLock<TableCache>>,
}

impl PartitionedTable {
    pub fn new(model: Model, connection: Arc<dyn Connection>) -> Self {
        Self {
            manager: PartitionManager::new(model, connection),
            tables: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn model(&self) -> &Model {
        self.manager.model()
    }

    pub fn manager(&self) -> &PartitionManager {
        &self.manager
    }

    fn configurator(&self) -> Box<dyn Configurator> {
        self.model().configurator()
    }

    /// Attribute names that make up the partition key, outermost first
    pub fn partition_keys(&self) -> Result<Vec<String>> {
        self.configurator().on_fields()
    }

    /// Pull the partition key values out of a record's attributes
    pub fn partition_key_values(&self, attributes: &JsonObject) -> Result<KeyValues> {
        self.partition_keys()?
            .into_iter()
            .map(|field| match attributes.get(&field) {
                Some(value) if !value.is_null() => KeyValue::from_json(value),
                _ => Err(Error::MissingPartitionKey {
                    model: self.model().name().to_string(),
                    field,
                }),
            })
            .collect()
    }

    pub fn partition_table_name(&self, key_values: &[KeyValue]) -> Result<String> {
        self.manager.adapter().partition_table_name(key_values)
    }

    pub fn partition_table_alias_name(&self, key_values: &[KeyValue]) -> Result<String> {
        self.manager.adapter().partition_table_alias_name(key_values)
    }

    /// The child table for `key_values`, optionally aliased.
    ///
    /// Resolved tables are cached per key values and alias.
    pub fn table_from_key_values(
        &self,
        key_values: &[KeyValue],
        alias: Option<&str>,
    ) -> Result<TableRef> {
        let cache_key = (key_values.to_vec(), alias.map(String::from));
        if let Some(table) = self.read_cache().get(&cache_key) {
            return Ok(table.clone());
        }

        let mut table = TableRef::new(self.partition_table_name(key_values)?);
        if let Some(alias) = alias {
            table = table.with_alias(alias);
        }
        debug!(model = self.model().name(), table = %table, "Resolved partition table");

        self.write_cache().insert(cache_key, table.clone());
        Ok(table)
    }

    /// The child table a record with these attributes belongs to
    pub fn dynamic_table(&self, attributes: &JsonObject, alias: Option<&str>) -> Result<TableRef> {
        let key_values = self.partition_key_values(attributes)?;
        self.table_from_key_values(&key_values, alias)
    }

    /// The child table aliased to its sanitized name, for SELECTs
    pub fn from_partition(&self, key_values: &[KeyValue]) -> Result<TableRef> {
        let alias = self.partition_table_alias_name(key_values)?;
        self.table_from_key_values(key_values, Some(&alias))
    }

    pub fn from_partition_without_alias(&self, key_values: &[KeyValue]) -> Result<TableRef> {
        self.table_from_key_values(key_values, None)
    }

    /// Route a record for INSERT or UPDATE
    pub fn route(&self, attributes: &JsonObject) -> Result<Route> {
        let key_values = self.partition_key_values(attributes)?;
        let table = self.table_from_key_values(&key_values, None)?;
        Ok(Route { key_values, table })
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, TableCache> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_cache(&self) -> std::sync::RwLockWriteGuard<'_, TableCache> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }
}
