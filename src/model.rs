//! Partitioned models
//!
//! A [`Model`] is an immutable chain of configuration layers, most-derived
//! first, ending at the partitioned base. Strategies and user models are
//! built by deriving a new layer on top of an existing model, so the chain
//! mirrors the ancestor chain a reader walks.

use crate::config::{Contract, Data, Dsl, Member};
use crate::error::{Error, MemberKind, Result};
use crate::reader::{Configurator, MultiLevelReader, Reader};
use crate::strategy::TimeBucket;
use crate::template::TemplateContext;
use crate::types::KeyValue;
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;

/// One level of a model's ancestor chain
#[derive(Debug)]
pub struct Layer {
    name: String,
    data: Data,
    contract: Contract,
    composes: bool,
}

impl Layer {
    pub(crate) fn new(name: String, data: Data, contract: Contract, composes: bool) -> Self {
        Self {
            name,
            data,
            contract,
            composes,
        }
    }

    /// Name of the strategy or model that declared this layer
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Partitioning data declared by this layer
    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Class-level members declared by this layer
    pub fn contract(&self) -> &Contract {
        &self.contract
    }
}

/// A partitioned model: its own layer plus every ancestor's
#[derive(Clone)]
pub struct Model {
    layers: Arc<Vec<Arc<Layer>>>,
}

impl Model {
    /// Start a chain with a root layer
    pub(crate) fn root(name: &str, configure: impl FnOnce(&mut Dsl)) -> Self {
        let mut dsl = Dsl::new(name, false);
        configure(&mut dsl);
        Self {
            layers: Arc::new(vec![Arc::new(Self::layer_from(dsl, false))]),
        }
    }

    /// Derive a built-in strategy that composes other strategies
    pub(crate) fn composing(&self, name: &str, configure: impl FnOnce(&mut Dsl)) -> Self {
        let mut dsl = Dsl::new(name, true);
        configure(&mut dsl);
        self.push(Self::layer_from(dsl, true))
    }

    /// Derive a built-in strategy; built-ins never fail validation
    pub(crate) fn strategy(&self, name: &str, configure: impl FnOnce(&mut Dsl)) -> Self {
        let mut dsl = Dsl::new(name, self.is_multi_level());
        configure(&mut dsl);
        self.push(Self::layer_from(dsl, false))
    }

    fn layer_from(dsl: Dsl, composes: bool) -> Layer {
        let (name, data, contract) = dsl.into_parts();
        Layer::new(name, data, contract, composes)
    }

    fn push(&self, layer: Layer) -> Self {
        let mut layers = Vec::with_capacity(self.layers.len() + 1);
        layers.push(Arc::new(layer));
        layers.extend(self.layers.iter().cloned());
        Self {
            layers: Arc::new(layers),
        }
    }

    /// Derive a model from this one and configure its partitioning.
    ///
    /// Fails when the block uses a call the inherited strategy does not
    /// accept, e.g. `on` below a multi-level strategy.
    pub fn derive(
        &self,
        name: impl Into<String>,
        configure: impl FnOnce(&mut Dsl),
    ) -> Result<Model> {
        let mut dsl = Dsl::new(name, self.is_multi_level());
        configure(&mut dsl);
        let (name, data, contract) = dsl.finish()?;
        Ok(self.push(Layer::new(name, data, contract, false)))
    }

    /// Name of the most-derived layer
    pub fn name(&self) -> &str {
        self.layers.first().map_or("", |l| l.name())
    }

    /// Layers, most-derived first
    pub fn layers(&self) -> impl Iterator<Item = &Arc<Layer>> {
        self.layers.iter()
    }

    /// Names of every layer, most-derived first
    pub fn ancestor_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    /// Check if any layer composes other strategies
    pub fn is_multi_level(&self) -> bool {
        self.layers.iter().any(|l| l.composes)
    }

    /// The reader appropriate for this model
    pub fn configurator(&self) -> Box<dyn Configurator> {
        if self.is_multi_level() {
            Box::new(MultiLevelReader::new(self.clone()))
        } else {
            Box::new(Reader::new(self.clone()))
        }
    }

    // ========================================================================
    // Class-level members
    // ========================================================================

    fn member<T: Clone>(
        &self,
        name: &str,
        pick: impl Fn(&Contract) -> Option<&Member<T>>,
    ) -> Result<T> {
        match self.layers.iter().find_map(|l| pick(&l.contract)) {
            Some(member) => member.get(self),
            None => Err(Error::not_implemented(self.name(), name, MemberKind::Class)),
        }
    }

    /// Parent table, optionally schema qualified
    pub fn table_name(&self) -> Result<String> {
        self.member("table_name", |c| c.table_name.as_ref())
    }

    pub fn partition_integer_field(&self) -> Result<String> {
        self.member("partition_integer_field", |c| c.integer_field.as_ref())
    }

    pub fn partition_table_size(&self) -> Result<i64> {
        self.member("partition_table_size", |c| c.table_size.as_ref())
    }

    pub fn partition_time_field(&self) -> Result<String> {
        self.member("partition_time_field", |c| c.time_field.as_ref())
    }

    pub fn partition_time_bucket(&self) -> Result<TimeBucket> {
        self.member("partition_time_bucket", |c| c.time_bucket.as_ref())
    }

    pub fn partition_foreign_key(&self) -> Result<String> {
        self.member("partition_foreign_key", |c| c.foreign_key.as_ref())
    }

    pub fn prefetch_primary_key(&self) -> bool {
        self.layers
            .iter()
            .find_map(|l| l.contract.prefetch_primary_key)
            .unwrap_or(false)
    }

    /// Canonical value of the bucket `value` falls into
    pub fn partition_normalize_key_value(&self, value: &KeyValue) -> Result<KeyValue> {
        match self.layers.iter().find_map(|l| l.contract.normalizer.as_ref()) {
            Some(normalize) => normalize(self, value),
            None => Ok(value.clone()),
        }
    }

    /// One normalised key value per bucket between `start` and `end`
    pub fn partition_generate_range(
        &self,
        start: &KeyValue,
        end: &KeyValue,
    ) -> Result<Vec<KeyValue>> {
        match self.layers.iter().find_map(|l| l.contract.range.as_ref()) {
            Some(generate) => generate(self, start, end),
            None => Err(Error::not_implemented(
                self.name(),
                "partition_generate_range",
                MemberKind::Class,
            )),
        }
    }

    /// Template context for resolving settings against this model
    pub fn template_context(&self, key_values: &[KeyValue]) -> TemplateContext {
        let mut members = Map::new();
        members.insert("name".into(), json!(self.name()));
        if let Ok(v) = self.table_name() {
            members.insert("table_name".into(), json!(v));
        }
        if let Ok(v) = self.partition_integer_field() {
            members.insert("integer_field".into(), json!(v));
        }
        if let Ok(v) = self.partition_table_size() {
            members.insert("table_size".into(), json!(v));
        }
        if let Ok(v) = self.partition_time_field() {
            members.insert("time_field".into(), json!(v));
        }
        if let Ok(v) = self.partition_foreign_key() {
            members.insert("foreign_key".into(), json!(v));
        }

        let mut ctx = TemplateContext::with_model(Value::Object(members));
        ctx.set_key_values(key_values.iter().map(KeyValue::to_json).collect());
        if let [only] = key_values {
            if let Ok(normalized) = self.partition_normalize_key_value(only) {
                ctx.set_normalized_value(normalized.to_json());
            }
        }
        ctx
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("layers", &self.ancestor_names())
            .finish()
    }
}
