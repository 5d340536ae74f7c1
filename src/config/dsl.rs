//! Builder for strategy layers
//!
//! Every call records into the layer being built. Collection calls
//! (`index`, `foreign_key`, hooks, `using_classes`) append; every other call
//! overwrites what was set before in the same block.

use super::contract::{Contract, Member};
use super::data::{Data, Entry, Field, ForeignKey, Index, IndexOptions, Setting};
use crate::error::{Error, Result};
use crate::model::Model;
use crate::sql::Connection;
use crate::strategy::TimeBucket;
use crate::types::{KeyValue, KeyValues};
use std::sync::Arc;

/// Partitioning DSL for one strategy layer
#[derive(Debug)]
pub struct Dsl {
    name: String,
    data: Data,
    contract: Contract,
    composes: bool,
    invalid: Vec<&'static str>,
}

impl Dsl {
    pub(crate) fn new(name: impl Into<String>, composes: bool) -> Self {
        Self {
            name: name.into(),
            data: Data::default(),
            contract: Contract::default(),
            composes,
            invalid: Vec::new(),
        }
    }

    /// Name of the layer being configured
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data recorded so far
    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Class-level members recorded so far
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    fn set(&mut self, field: Field, value: impl Into<Setting>) -> &mut Self {
        *self.data.setting_mut(field) = Some(value.into());
        self
    }

    // ========================================================================
    // Partition data
    // ========================================================================

    /// Partition column. Not available on multi-level strategies.
    pub fn on(&mut self, field: impl Into<Setting>) -> &mut Self {
        if self.composes {
            self.invalid.push("on");
            return self;
        }
        self.set(Field::OnField, field)
    }

    /// Add an index created on every child table
    pub fn index(&mut self, field: impl Into<String>, options: IndexOptions) -> &mut Self {
        self.data
            .indexes
            .push(Entry::Literal(Index::new(field, options)));
        self
    }

    /// Add an index computed per key-value tuple
    pub fn index_with<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Model, &[KeyValue]) -> Result<Index> + Send + Sync + 'static,
    {
        self.data.indexes.push(Entry::computed(f));
        self
    }

    /// Add a foreign key (`"company_id"` references `companies (id)`)
    pub fn foreign_key(&mut self, foreign_key: impl Into<ForeignKey>) -> &mut Self {
        self.data
            .foreign_keys
            .push(Entry::Literal(foreign_key.into()));
        self
    }

    /// Add a foreign key computed per key-value tuple
    pub fn foreign_key_with<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Model, &[KeyValue]) -> Result<ForeignKey> + Send + Sync + 'static,
    {
        self.data.foreign_keys.push(Entry::computed(f));
        self
    }

    /// CHECK constraint body of each child table
    pub fn check_constraint(&mut self, value: impl Into<Setting>) -> &mut Self {
        self.set(Field::CheckConstraint, value)
    }

    /// ORDER BY clause used when listing existing child tables
    pub fn order(&mut self, clause: impl Into<Setting>) -> &mut Self {
        self.set(Field::LastPartitionsOrderByClause, clause)
    }

    /// Schema holding the child tables
    pub fn schema_name(&mut self, value: impl Into<Setting>) -> &mut Self {
        self.set(Field::SchemaName, value)
    }

    /// Prefix prepended to each base name
    pub fn name_prefix(&mut self, value: impl Into<Setting>) -> &mut Self {
        self.set(Field::NamePrefix, value)
    }

    /// Child table name without schema or prefix
    pub fn base_name(&mut self, value: impl Into<Setting>) -> &mut Self {
        self.set(Field::BaseName, value)
    }

    /// Child table name without schema
    pub fn part_name(&mut self, value: impl Into<Setting>) -> &mut Self {
        self.set(Field::PartName, value)
    }

    /// Fully qualified child table name
    pub fn table_name(&mut self, value: impl Into<Setting>) -> &mut Self {
        self.set(Field::TableName, value)
    }

    /// Alias used when selecting from a child table
    pub fn table_alias_name(&mut self, value: impl Into<Setting>) -> &mut Self {
        self.set(Field::TableAliasName, value)
    }

    /// Schema of the table each child inherits from
    pub fn parent_table_schema_name(&mut self, value: impl Into<Setting>) -> &mut Self {
        self.set(Field::ParentTableSchemaName, value)
    }

    /// Table each child inherits from
    pub fn parent_table_name(&mut self, value: impl Into<Setting>) -> &mut Self {
        self.set(Field::ParentTableName, value)
    }

    // ========================================================================
    // Janitorial schedules and hooks
    // ========================================================================

    /// Key values whose child tables should exist
    pub fn janitorial_creates_needed<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Model) -> Result<Vec<KeyValues>> + Send + Sync + 'static,
    {
        self.data.janitorial_creates_needed = Some(Arc::new(f));
        self
    }

    /// Key values whose child tables should be detached
    pub fn janitorial_archives_needed<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Model) -> Result<Vec<KeyValues>> + Send + Sync + 'static,
    {
        self.data.janitorial_archives_needed = Some(Arc::new(f));
        self
    }

    /// Key values whose child tables should be dropped
    pub fn janitorial_drops_needed<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Model) -> Result<Vec<KeyValues>> + Send + Sync + 'static,
    {
        self.data.janitorial_drops_needed = Some(Arc::new(f));
        self
    }

    /// Run `f` after each child table is created
    pub fn after_partition_table_create_hook<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Model, &[KeyValue], &dyn Connection) -> Result<()> + Send + Sync + 'static,
    {
        self.data
            .after_partition_table_create_hooks
            .push(Arc::new(f));
        self
    }

    /// Compose strategies, outermost level first
    pub fn using_classes(&mut self, models: impl IntoIterator<Item = Model>) -> &mut Self {
        self.data.using_classes.extend(models);
        self
    }

    // ========================================================================
    // Model members
    // ========================================================================

    /// Parent table of the model (`employees`, `other.foos`)
    pub fn model_table_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.contract.table_name = Some(Member::Value(name.into()));
        self
    }

    /// Integer column the model is partitioned on
    pub fn integer_field(&mut self, field: impl Into<String>) -> &mut Self {
        self.contract.integer_field = Some(Member::Value(field.into()));
        self
    }

    /// Width of an integer bucket
    pub fn table_size(&mut self, size: i64) -> &mut Self {
        self.contract.table_size = Some(Member::Value(size));
        self
    }

    /// Date or timestamp column the model is partitioned on
    pub fn time_field(&mut self, field: impl Into<String>) -> &mut Self {
        self.contract.time_field = Some(Member::Value(field.into()));
        self
    }

    /// Width of a time bucket
    pub fn time_bucket(&mut self, bucket: TimeBucket) -> &mut Self {
        self.contract.time_bucket = Some(Member::Value(bucket));
        self
    }

    /// Foreign key column the model is partitioned on
    pub fn foreign_key_field(&mut self, field: impl Into<String>) -> &mut Self {
        self.contract.foreign_key = Some(Member::Value(field.into()));
        self
    }

    /// Whether ids are fetched from the sequence before insert
    pub fn prefetch_primary_key(&mut self, prefetch: bool) -> &mut Self {
        self.contract.prefetch_primary_key = Some(prefetch);
        self
    }

    /// Direct access to the class-level members for derived values
    pub fn contract_mut(&mut self) -> &mut Contract {
        &mut self.contract
    }

    // ========================================================================
    // Finish
    // ========================================================================

    pub(crate) fn finish(self) -> Result<(String, Data, Contract)> {
        if let Some(member) = self.invalid.first() {
            return Err(Error::InvalidForMultiLevel {
                model: self.name,
                member: (*member).to_string(),
            });
        }
        Ok(self.into_parts())
    }

    pub(crate) fn into_parts(self) -> (String, Data, Contract) {
        (self.name, self.data, self.contract)
    }
}
