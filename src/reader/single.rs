//! Single-level reader

use super::Configurator;
use crate::config::{Data, Field, ForeignKey, Index, Schedule, Setting};
use crate::error::{Error, MemberKind, Result};
use crate::model::{Layer, Model};
use crate::sql::Connection;
use crate::template;
use crate::types::{display_key_values, KeyValue, KeyValues};
use std::sync::Arc;
use tracing::debug;

/// One layer of a resolution chain and the model its values are evaluated
/// against
#[derive(Debug, Clone)]
pub struct ChainEntry {
    model: Model,
    layer: Arc<Layer>,
}

impl ChainEntry {
    pub fn new(model: Model, layer: Arc<Layer>) -> Self {
        Self { model, layer }
    }

    /// Model passed to callables and templates of this layer
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    pub fn data(&self) -> &Data {
        self.layer.data()
    }

    fn resolve(&self, setting: &Setting, key_values: &[KeyValue]) -> Result<String> {
        match setting {
            Setting::Literal(value) => Ok(value.clone()),
            Setting::Template(text) => {
                template::render(text, &self.model.template_context(key_values))
            }
            Setting::Computed(f) => f(&self.model, key_values),
        }
    }
}

/// Resolves a model's configuration by walking its ancestor chain
#[derive(Debug, Clone)]
pub struct Reader {
    model: Model,
    chain: Vec<ChainEntry>,
}

impl Reader {
    /// Reader over the model's own ancestor chain
    pub fn new(model: Model) -> Self {
        let chain = model
            .layers()
            .map(|layer| ChainEntry::new(model.clone(), Arc::clone(layer)))
            .collect();
        Self { model, chain }
    }

    /// Reader over an explicit chain
    pub fn with_chain(model: Model, chain: Vec<ChainEntry>) -> Self {
        Self { model, chain }
    }

    /// The resolution chain, most-derived first
    pub fn configurators(&self) -> &[ChainEntry] {
        &self.chain
    }

    /// Resolve a singular field; `None` when no layer defines it
    pub fn resolve(&self, field: Field, key_values: &[KeyValue]) -> Result<Option<String>> {
        for entry in &self.chain {
            let Some(setting) = entry.data().setting(field) else {
                continue;
            };
            if setting.is_empty() {
                continue;
            }
            return entry
                .resolve(setting, key_values)
                .map(Some)
                .map_err(|e| Error::resolution(field.as_str(), display_key_values(key_values), e));
        }
        Ok(None)
    }

    /// Resolve a singular field every model must provide
    pub fn require(&self, field: Field, key_values: &[KeyValue]) -> Result<String> {
        self.resolve(field, key_values)?.ok_or_else(|| {
            Error::not_implemented(self.model.name(), field.as_str(), MemberKind::Instance)
        })
    }

    fn schedule(
        &self,
        name: &str,
        pick: impl Fn(&Data) -> Option<&Schedule>,
    ) -> Result<Vec<KeyValues>> {
        match self.chain.iter().find_map(|e| pick(e.data()).map(|s| (e, s))) {
            Some((entry, schedule)) => {
                schedule(&entry.model).map_err(|e| Error::resolution(name, "", e))
            }
            None => Ok(Vec::new()),
        }
    }
}

impl Configurator for Reader {
    fn model(&self) -> &Model {
        &self.model
    }

    fn on_fields(&self) -> Result<Vec<String>> {
        Ok(vec![self.require(Field::OnField, &[])?])
    }

    fn schema_name(&self) -> Result<String> {
        self.require(Field::SchemaName, &[])
    }

    fn name_prefix(&self) -> Result<String> {
        self.require(Field::NamePrefix, &[])
    }

    fn base_name(&self, key_values: &[KeyValue]) -> Result<String> {
        self.require(Field::BaseName, key_values)
    }

    fn part_name(&self, key_values: &[KeyValue]) -> Result<String> {
        self.require(Field::PartName, key_values)
    }

    fn table_name(&self, key_values: &[KeyValue]) -> Result<String> {
        self.require(Field::TableName, key_values)
    }

    fn table_alias_name(&self, key_values: &[KeyValue]) -> Result<String> {
        self.require(Field::TableAliasName, key_values)
    }

    fn parent_table_name(&self, key_values: &[KeyValue]) -> Result<String> {
        self.require(Field::ParentTableName, key_values)
    }

    fn parent_table_schema_name(&self, key_values: &[KeyValue]) -> Result<String> {
        self.require(Field::ParentTableSchemaName, key_values)
    }

    fn check_constraint(&self, key_values: &[KeyValue]) -> Result<String> {
        self.require(Field::CheckConstraint, key_values)
    }

    fn indexes(&self, key_values: &[KeyValue]) -> Result<Vec<Index>> {
        let mut indexes = Vec::new();
        for entry in &self.chain {
            for index in &entry.data().indexes {
                indexes.push(index.resolve(&entry.model, key_values).map_err(|e| {
                    Error::resolution("indexes", display_key_values(key_values), e)
                })?);
            }
        }
        Ok(indexes)
    }

    fn foreign_keys(&self, key_values: &[KeyValue]) -> Result<Vec<ForeignKey>> {
        let mut foreign_keys: Vec<ForeignKey> = Vec::new();
        for entry in &self.chain {
            for foreign_key in &entry.data().foreign_keys {
                let foreign_key = foreign_key.resolve(&entry.model, key_values).map_err(|e| {
                    Error::resolution("foreign_keys", display_key_values(key_values), e)
                })?;
                if !foreign_keys.contains(&foreign_key) {
                    foreign_keys.push(foreign_key);
                }
            }
        }
        Ok(foreign_keys)
    }

    fn last_partitions_order_by_clause(&self) -> Result<Option<String>> {
        self.resolve(Field::LastPartitionsOrderByClause, &[])
    }

    fn janitorial_creates_needed(&self) -> Result<Vec<KeyValues>> {
        self.schedule("janitorial_creates_needed", |d| {
            d.janitorial_creates_needed.as_ref()
        })
    }

    fn janitorial_archives_needed(&self) -> Result<Vec<KeyValues>> {
        self.schedule("janitorial_archives_needed", |d| {
            d.janitorial_archives_needed.as_ref()
        })
    }

    fn janitorial_drops_needed(&self) -> Result<Vec<KeyValues>> {
        self.schedule("janitorial_drops_needed", |d| d.janitorial_drops_needed.as_ref())
    }

    fn run_after_partition_table_create_hooks(
        &self,
        key_values: &[KeyValue],
        connection: &dyn Connection,
    ) -> Result<()> {
        for entry in &self.chain {
            for hook in &entry.data().after_partition_table_create_hooks {
                debug!(
                    layer = entry.layer.name(),
                    key_values = %display_key_values(key_values),
                    "Running after-create hook"
                );
                hook(&entry.model, key_values, connection)?;
            }
        }
        Ok(())
    }
}
