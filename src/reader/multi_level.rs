//! Multi-level reader
//!
//! Each composed strategy ("level") owns one key value. Level `i` resolves
//! names and constraints for key value `i`; the child for `(k0, .., kn)`
//! inherits from the child for `(k0, .., kn-1)`.

use super::single::{ChainEntry, Reader};
use super::Configurator;
use crate::config::{ForeignKey, Index};
use crate::error::{Error, Result};
use crate::model::Model;
use crate::sql::Connection;
use crate::types::{KeyValue, KeyValues};
use std::sync::Arc;

/// Reader for models derived from the multi-level strategy
#[derive(Debug, Clone)]
pub struct MultiLevelReader {
    /// The model's own chain
    own: Reader,
    /// Own chain followed by every level's chain
    extended: Reader,
    levels: Vec<Model>,
    using_start: usize,
}

impl MultiLevelReader {
    pub fn new(model: Model) -> Self {
        let own = Reader::new(model.clone());
        let levels: Vec<Model> = own
            .configurators()
            .iter()
            .flat_map(|entry| entry.data().using_classes.iter().cloned())
            .collect();

        let mut chain = own.configurators().to_vec();
        let using_start = chain.len();
        for level in &levels {
            chain.extend(
                level
                    .layers()
                    .map(|layer| ChainEntry::new(level.clone(), Arc::clone(layer))),
            );
        }

        Self {
            own,
            extended: Reader::with_chain(model, chain),
            levels,
            using_start,
        }
    }

    /// Composed strategies, outermost first
    pub fn using_classes(&self) -> &[Model] {
        &self.levels
    }

    /// Every layer of every composed strategy, level by level
    pub fn using_configurators(&self) -> &[ChainEntry] {
        &self.extended.configurators()[self.using_start..]
    }

    /// Strategy for level `index`
    pub fn using_class(&self, index: usize) -> Result<&Model> {
        self.levels.get(index).ok_or_else(|| Error::KeyArity {
            field: "using_class".to_string(),
            expected: self.levels.len(),
            actual: index + 1,
        })
    }

    /// Resolved configuration of level `index`
    pub fn using_configurator(&self, index: usize) -> Result<Box<dyn Configurator>> {
        Ok(self.using_class(index)?.configurator())
    }

    fn check_arity(&self, field: &str, key_values: &[KeyValue]) -> Result<()> {
        if key_values.len() > self.levels.len() {
            return Err(Error::KeyArity {
                field: field.to_string(),
                expected: self.levels.len(),
                actual: key_values.len(),
            });
        }
        Ok(())
    }
}

impl Configurator for MultiLevelReader {
    fn model(&self) -> &Model {
        self.own.model()
    }

    fn on_fields(&self) -> Result<Vec<String>> {
        let mut fields = Vec::new();
        for level in &self.levels {
            fields.extend(level.configurator().on_fields()?);
        }
        Ok(fields)
    }

    fn schema_name(&self) -> Result<String> {
        self.extended.schema_name()
    }

    fn name_prefix(&self) -> Result<String> {
        self.extended.name_prefix()
    }

    fn base_name(&self, key_values: &[KeyValue]) -> Result<String> {
        self.check_arity("base_name", key_values)?;
        let parts = key_values
            .iter()
            .enumerate()
            .map(|(i, value)| self.using_configurator(i)?.base_name(std::slice::from_ref(value)))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join("_"))
    }

    fn part_name(&self, key_values: &[KeyValue]) -> Result<String> {
        self.extended.part_name(key_values)
    }

    fn table_name(&self, key_values: &[KeyValue]) -> Result<String> {
        self.extended.table_name(key_values)
    }

    fn table_alias_name(&self, key_values: &[KeyValue]) -> Result<String> {
        self.extended.table_alias_name(key_values)
    }

    fn parent_table_name(&self, key_values: &[KeyValue]) -> Result<String> {
        match key_values {
            [] | [_] => self.extended.parent_table_name(key_values),
            [outer @ .., _] => Ok(format!(
                "{}.{}{}",
                self.parent_table_schema_name(key_values)?,
                self.name_prefix()?,
                self.base_name(outer)?
            )),
        }
    }

    fn parent_table_schema_name(&self, key_values: &[KeyValue]) -> Result<String> {
        if key_values.len() <= 1 {
            self.extended.parent_table_schema_name(key_values)
        } else {
            self.schema_name()
        }
    }

    fn check_constraint(&self, key_values: &[KeyValue]) -> Result<String> {
        self.check_arity("check_constraint", key_values)?;
        let Some((last, _)) = key_values.split_last() else {
            return Err(Error::KeyArity {
                field: "check_constraint".to_string(),
                expected: self.levels.len(),
                actual: 0,
            });
        };
        self.using_configurator(key_values.len() - 1)?
            .check_constraint(std::slice::from_ref(last))
    }

    fn indexes(&self, key_values: &[KeyValue]) -> Result<Vec<Index>> {
        self.check_arity("indexes", key_values)?;
        let mut indexes = self.own.indexes(key_values)?;
        for (i, value) in key_values.iter().enumerate() {
            indexes.extend(self.using_configurator(i)?.indexes(std::slice::from_ref(value))?);
        }
        Ok(indexes)
    }

    fn foreign_keys(&self, key_values: &[KeyValue]) -> Result<Vec<ForeignKey>> {
        self.check_arity("foreign_keys", key_values)?;
        let mut foreign_keys = self.own.foreign_keys(key_values)?;
        for (i, value) in key_values.iter().enumerate() {
            for foreign_key in self
                .using_configurator(i)?
                .foreign_keys(std::slice::from_ref(value))?
            {
                if !foreign_keys.contains(&foreign_key) {
                    foreign_keys.push(foreign_key);
                }
            }
        }
        Ok(foreign_keys)
    }

    fn last_partitions_order_by_clause(&self) -> Result<Option<String>> {
        self.extended.last_partitions_order_by_clause()
    }

    fn janitorial_creates_needed(&self) -> Result<Vec<KeyValues>> {
        self.extended.janitorial_creates_needed()
    }

    fn janitorial_archives_needed(&self) -> Result<Vec<KeyValues>> {
        self.extended.janitorial_archives_needed()
    }

    fn janitorial_drops_needed(&self) -> Result<Vec<KeyValues>> {
        self.extended.janitorial_drops_needed()
    }

    fn run_after_partition_table_create_hooks(
        &self,
        key_values: &[KeyValue],
        connection: &dyn Connection,
    ) -> Result<()> {
        self.extended
            .run_after_partition_table_create_hooks(key_values, connection)
    }
}
