//! Class-level members a strategy expects its model to provide
//!
//! These are the values a configuration reads through `model` rather than
//! through the DSL: the parent table, the partition column, the bucket size
//! and the key normalisation rules.

use crate::error::Result;
use crate::model::Model;
use crate::strategy::TimeBucket;
use crate::types::KeyValue;
use std::fmt;
use std::sync::Arc;

/// Member derived from the (most-derived) model when read
pub type Derived<T> = Arc<dyn Fn(&Model) -> Result<T> + Send + Sync>;

/// Maps a raw key value to the canonical value of its bucket
pub type Normalizer = Arc<dyn Fn(&Model, &KeyValue) -> Result<KeyValue> + Send + Sync>;

/// Expands `start..=end` into one key value per bucket
pub type RangeGenerator =
    Arc<dyn Fn(&Model, &KeyValue, &KeyValue) -> Result<Vec<KeyValue>> + Send + Sync>;

/// A class-level member: either a fixed value or derived from the model
#[derive(Clone)]
pub enum Member<T> {
    Value(T),
    Derived(Derived<T>),
}

impl<T: Clone> Member<T> {
    /// Create a derived member
    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&Model) -> Result<T> + Send + Sync + 'static,
    {
        Self::Derived(Arc::new(f))
    }

    /// Read the member for a model
    pub fn get(&self, model: &Model) -> Result<T> {
        match self {
            Member::Value(value) => Ok(value.clone()),
            Member::Derived(f) => f(model),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Value(value) => value.fmt(f),
            Member::Derived(_) => f.write_str("<derived>"),
        }
    }
}

/// Class-level members declared by one layer
#[derive(Clone, Default)]
pub struct Contract {
    /// Parent table, optionally schema qualified (`other.foos`)
    pub table_name: Option<Member<String>>,
    /// Integer partition column
    pub integer_field: Option<Member<String>>,
    /// Width of an integer bucket
    pub table_size: Option<Member<i64>>,
    /// Date/timestamp partition column
    pub time_field: Option<Member<String>>,
    /// Width of a time bucket
    pub time_bucket: Option<Member<TimeBucket>>,
    /// Foreign key partition column
    pub foreign_key: Option<Member<String>>,
    /// Whether ids must be fetched from the sequence before insert
    pub prefetch_primary_key: Option<bool>,
    pub normalizer: Option<Normalizer>,
    pub range: Option<RangeGenerator>,
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("table_name", &self.table_name)
            .field("integer_field", &self.integer_field)
            .field("table_size", &self.table_size)
            .field("time_field", &self.time_field)
            .field("time_bucket", &self.time_bucket)
            .field("foreign_key", &self.foreign_key)
            .field("prefetch_primary_key", &self.prefetch_primary_key)
            .finish_non_exhaustive()
    }
}
