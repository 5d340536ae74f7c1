//! Configuration data
//!
//! The values a strategy layer declares through the DSL and the reader
//! later resolves. Nothing here is evaluated; settings are only stored.

use crate::error::Result;
use crate::model::Model;
use crate::sql::Connection;
use crate::template;
use crate::types::{KeyValue, KeyValues};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Callable setting: `(model, key_values) -> value`
pub type Resolver<T> = Arc<dyn Fn(&Model, &[KeyValue]) -> Result<T> + Send + Sync>;

/// Janitorial schedule: produces the key-value tuples to act on
pub type Schedule = Arc<dyn Fn(&Model) -> Result<Vec<KeyValues>> + Send + Sync>;

/// Hook run once a new child table has its indexes and references
pub type Hook = Arc<dyn Fn(&Model, &[KeyValue], &dyn Connection) -> Result<()> + Send + Sync>;

// ============================================================================
// Setting
// ============================================================================

/// A string-valued setting: literal, `{{ }}` template, or callable
#[derive(Clone)]
pub enum Setting {
    /// Used verbatim
    Literal(String),
    /// Rendered against the model and key values at read time
    Template(String),
    /// Invoked with the model and key values at read time
    Computed(Resolver<String>),
}

impl Setting {
    /// Create a computed setting
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Model, &[KeyValue]) -> Result<String> + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }

    /// Literal and template settings with no text count as undefined
    pub fn is_empty(&self) -> bool {
        match self {
            Setting::Literal(s) | Setting::Template(s) => s.is_empty(),
            Setting::Computed(_) => false,
        }
    }
}

impl From<&str> for Setting {
    fn from(value: &str) -> Self {
        Setting::from(value.to_string())
    }
}

impl From<String> for Setting {
    fn from(value: String) -> Self {
        if template::has_templates(&value) {
            Setting::Template(value)
        } else {
            Setting::Literal(value)
        }
    }
}

impl fmt::Debug for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setting::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            Setting::Template(s) => f.debug_tuple("Template").field(s).finish(),
            Setting::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

// ============================================================================
// Collection entries
// ============================================================================

/// An entry of a collection setting (indexes, foreign keys)
#[derive(Clone)]
pub enum Entry<T> {
    /// Used verbatim
    Literal(T),
    /// Invoked with the model and key values at read time
    Computed(Resolver<T>),
}

impl<T> Entry<T> {
    /// Create a computed entry
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Model, &[KeyValue]) -> Result<T> + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }

    /// Check if this entry is a callable
    pub fn is_computed(&self) -> bool {
        matches!(self, Entry::Computed(_))
    }
}

impl<T: Clone> Entry<T> {
    /// Resolve the entry for a model and key values
    pub fn resolve(&self, model: &Model, key_values: &[KeyValue]) -> Result<T> {
        match self {
            Entry::Literal(value) => Ok(value.clone()),
            Entry::Computed(f) => f(model, key_values),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Entry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Entry::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

// ============================================================================
// Index
// ============================================================================

/// Options for an index created on every child table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    /// Create a UNIQUE index
    pub unique: bool,
    /// Index method (`btree`, `gin`, ...)
    pub using: Option<String>,
    /// Partial index predicate
    #[serde(rename = "where")]
    pub where_clause: Option<String>,
}

impl IndexOptions {
    /// Options for a unique index
    pub fn unique() -> Self {
        Self {
            unique: true,
            ..Default::default()
        }
    }
}

/// An index on one or more columns (comma separated)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Indexed column(s)
    pub field: String,
    /// Index options
    #[serde(flatten)]
    pub options: IndexOptions,
}

impl Index {
    /// Create an index
    pub fn new(field: impl Into<String>, options: IndexOptions) -> Self {
        Self {
            field: field.into(),
            options,
        }
    }

    /// Create a unique index
    pub fn unique(field: impl Into<String>) -> Self {
        Self::new(field, IndexOptions::unique())
    }

    /// Normalised column list, used to detect duplicate definitions
    pub fn columns(&self) -> Vec<String> {
        self.field
            .split(',')
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect()
    }
}

// ============================================================================
// Foreign Key
// ============================================================================

/// A foreign key added to every child table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Column on the child table
    pub referencing_field: String,
    /// Referenced table
    pub referenced_table: String,
    /// Referenced column
    pub referenced_field: String,
}

impl ForeignKey {
    /// Reference the conventional table for a `<name>_id` column, on `id`
    pub fn new(referencing_field: impl Into<String>) -> Self {
        let referencing_field = referencing_field.into();
        let referenced_table = foreign_key_to_foreign_table_name(&referencing_field);
        Self {
            referencing_field,
            referenced_table,
            referenced_field: "id".to_string(),
        }
    }

    /// Reference an explicit table and column
    pub fn references(
        referencing_field: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_field: impl Into<String>,
    ) -> Self {
        Self {
            referencing_field: referencing_field.into(),
            referenced_table: referenced_table.into(),
            referenced_field: referenced_field.into(),
        }
    }
}

impl From<&str> for ForeignKey {
    fn from(referencing_field: &str) -> Self {
        ForeignKey::new(referencing_field)
    }
}

/// Map a foreign key column to its table: `company_id` → `companies`
pub fn foreign_key_to_foreign_table_name(foreign_key_field: &str) -> String {
    let singular = foreign_key_field
        .strip_suffix("_id")
        .unwrap_or(foreign_key_field);
    pluralize(singular)
}

/// English plural of a table-ish word, good enough for column naming conventions
fn pluralize(word: &str) -> String {
    const VOWELS: [char; 5] = ['a', 'e', 'i', 'o', 'u'];

    if word.is_empty() {
        return String::new();
    }
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(VOWELS) {
            return format!("{stem}ies");
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| word.ends_with(s)) {
        return format!("{word}es");
    }
    format!("{word}s")
}

// ============================================================================
// Data
// ============================================================================

/// Singular, string-valued configuration fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    OnField,
    SchemaName,
    NamePrefix,
    BaseName,
    PartName,
    TableName,
    TableAliasName,
    ParentTableName,
    ParentTableSchemaName,
    CheckConstraint,
    LastPartitionsOrderByClause,
}

impl Field {
    /// Field name as used in errors and logs
    pub fn as_str(self) -> &'static str {
        match self {
            Field::OnField => "on_field",
            Field::SchemaName => "schema_name",
            Field::NamePrefix => "name_prefix",
            Field::BaseName => "base_name",
            Field::PartName => "part_name",
            Field::TableName => "table_name",
            Field::TableAliasName => "table_alias_name",
            Field::ParentTableName => "parent_table_name",
            Field::ParentTableSchemaName => "parent_table_schema_name",
            Field::CheckConstraint => "check_constraint",
            Field::LastPartitionsOrderByClause => "last_partitions_order_by_clause",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partitioning configuration declared by one strategy layer
#[derive(Clone, Default)]
pub struct Data {
    pub on_field: Option<Setting>,
    pub indexes: Vec<Entry<Index>>,
    pub foreign_keys: Vec<Entry<ForeignKey>>,
    pub check_constraint: Option<Setting>,
    pub last_partitions_order_by_clause: Option<Setting>,

    pub schema_name: Option<Setting>,
    pub name_prefix: Option<Setting>,
    pub base_name: Option<Setting>,
    pub part_name: Option<Setting>,
    pub table_name: Option<Setting>,
    pub table_alias_name: Option<Setting>,
    pub parent_table_schema_name: Option<Setting>,
    pub parent_table_name: Option<Setting>,

    pub janitorial_creates_needed: Option<Schedule>,
    pub janitorial_archives_needed: Option<Schedule>,
    pub janitorial_drops_needed: Option<Schedule>,

    pub after_partition_table_create_hooks: Vec<Hook>,

    /// Strategies composed by a multi-level layer, outermost first
    pub using_classes: Vec<Model>,
}

impl Data {
    /// Look up a singular setting
    pub fn setting(&self, field: Field) -> Option<&Setting> {
        match field {
            Field::OnField => self.on_field.as_ref(),
            Field::SchemaName => self.schema_name.as_ref(),
            Field::NamePrefix => self.name_prefix.as_ref(),
            Field::BaseName => self.base_name.as_ref(),
            Field::PartName => self.part_name.as_ref(),
            Field::TableName => self.table_name.as_ref(),
            Field::TableAliasName => self.table_alias_name.as_ref(),
            Field::ParentTableName => self.parent_table_name.as_ref(),
            Field::ParentTableSchemaName => self.parent_table_schema_name.as_ref(),
            Field::CheckConstraint => self.check_constraint.as_ref(),
            Field::LastPartitionsOrderByClause => self.last_partitions_order_by_clause.as_ref(),
        }
    }

    pub(crate) fn setting_mut(&mut self, field: Field) -> &mut Option<Setting> {
        match field {
            Field::OnField => &mut self.on_field,
            Field::SchemaName => &mut self.schema_name,
            Field::NamePrefix => &mut self.name_prefix,
            Field::BaseName => &mut self.base_name,
            Field::PartName => &mut self.part_name,
            Field::TableName => &mut self.table_name,
            Field::TableAliasName => &mut self.table_alias_name,
            Field::ParentTableName => &mut self.parent_table_name,
            Field::ParentTableSchemaName => &mut self.parent_table_schema_name,
            Field::CheckConstraint => &mut self.check_constraint,
            Field::LastPartitionsOrderByClause => &mut self.last_partitions_order_by_clause,
        }
    }

    /// Check if this layer declares nothing at all
    pub fn is_empty(&self) -> bool {
        ALL_FIELDS.iter().all(|f| self.setting(*f).is_none())
            && self.indexes.is_empty()
            && self.foreign_keys.is_empty()
            && self.janitorial_creates_needed.is_none()
            && self.janitorial_archives_needed.is_none()
            && self.janitorial_drops_needed.is_none()
            && self.after_partition_table_create_hooks.is_empty()
            && self.using_classes.is_empty()
    }
}

/// Every singular field, in declaration order
pub const ALL_FIELDS: [Field; 11] = [
    Field::OnField,
    Field::SchemaName,
    Field::NamePrefix,
    Field::BaseName,
    Field::PartName,
    Field::TableName,
    Field::TableAliasName,
    Field::ParentTableName,
    Field::ParentTableSchemaName,
    Field::CheckConstraint,
    Field::LastPartitionsOrderByClause,
];

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Data");
        for field in ALL_FIELDS {
            if let Some(setting) = self.setting(field) {
                s.field(field.as_str(), setting);
            }
        }
        s.field("indexes", &self.indexes)
            .field("foreign_keys", &self.foreign_keys)
            .field(
                "after_partition_table_create_hooks",
                &self.after_partition_table_create_hooks.len(),
            )
            .field(
                "using_classes",
                &self.using_classes.iter().map(Model::name).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
