//! Loader types
//!
//! Declarative partitioned table definitions for YAML parsing.

use crate::strategy::TimeBucket;
use serde::{Deserialize, Serialize};

// ============================================================================
// Tables Definition
// ============================================================================

/// Top-level definitions file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TablesDefinition {
    /// Partitioned tables
    pub tables: Vec<TableDefinition>,
}

impl TablesDefinition {
    /// Find a table by model name or parent table name
    pub fn find(&self, name: &str) -> Option<&TableDefinition> {
        self.tables
            .iter()
            .find(|t| t.name == name || t.table_name == name)
    }
}

/// One partitioned table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TableDefinition {
    /// Model name, e.g. `Employee`
    pub name: String,
    /// Parent table, optionally schema-qualified
    pub table_name: String,
    /// Partitioning strategy
    pub strategy: StrategyDefinition,
    /// Schema for child tables (template)
    #[serde(default)]
    pub schema_name: Option<String>,
    /// Child table name prefix
    #[serde(default)]
    pub name_prefix: Option<String>,
    /// Alias for child tables in queries (template)
    #[serde(default)]
    pub table_alias_name: Option<String>,
    /// CHECK constraint for child tables (template)
    #[serde(default)]
    pub check_constraint: Option<String>,
    /// ORDER BY clause for listing the latest child tables
    #[serde(default)]
    pub order: Option<String>,
    /// Extra indexes on every child table
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
    /// Extra foreign keys on every child table
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDefinition>,
    /// Maintenance window, time strategies only
    #[serde(default)]
    pub janitorial: Option<JanitorialDefinition>,
}

// ============================================================================
// Strategy Definition
// ============================================================================

/// Built-in strategy a table derives from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyDefinition {
    /// Ranges of the `id` column
    ById {
        #[serde(default)]
        table_size: Option<i64>,
    },
    /// Ranges of an integer column
    ByIntegerField {
        field: String,
        #[serde(default)]
        table_size: Option<i64>,
    },
    /// One child table per referenced row
    ByForeignKey { field: String },
    /// Time buckets of a date column
    ByTimeField {
        field: String,
        #[serde(default)]
        bucket: Option<TimeBucket>,
    },
    ByDailyTimeField { field: String },
    ByWeeklyTimeField { field: String },
    ByMonthlyTimeField { field: String },
    ByYearlyTimeField { field: String },
    /// Nested levels, outermost first
    MultiLevel { levels: Vec<StrategyDefinition> },
}

impl StrategyDefinition {
    /// Type tag as written in YAML
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyDefinition::ById { .. } => "by_id",
            StrategyDefinition::ByIntegerField { .. } => "by_integer_field",
            StrategyDefinition::ByForeignKey { .. } => "by_foreign_key",
            StrategyDefinition::ByTimeField { .. } => "by_time_field",
            StrategyDefinition::ByDailyTimeField { .. } => "by_daily_time_field",
            StrategyDefinition::ByWeeklyTimeField { .. } => "by_weekly_time_field",
            StrategyDefinition::ByMonthlyTimeField { .. } => "by_monthly_time_field",
            StrategyDefinition::ByYearlyTimeField { .. } => "by_yearly_time_field",
            StrategyDefinition::MultiLevel { .. } => "multi_level",
        }
    }

    /// Bucket of a time strategy
    pub fn time_bucket(&self) -> Option<TimeBucket> {
        match self {
            StrategyDefinition::ByTimeField { bucket, .. } => {
                Some(bucket.unwrap_or(TimeBucket::Day))
            }
            StrategyDefinition::ByDailyTimeField { .. } => Some(TimeBucket::Day),
            StrategyDefinition::ByWeeklyTimeField { .. } => Some(TimeBucket::Week),
            StrategyDefinition::ByMonthlyTimeField { .. } => Some(TimeBucket::Month),
            StrategyDefinition::ByYearlyTimeField { .. } => Some(TimeBucket::Year),
            _ => None,
        }
    }

    pub fn is_multi_level(&self) -> bool {
        matches!(self, StrategyDefinition::MultiLevel { .. })
    }
}

// ============================================================================
// Index / Foreign Key Definitions
// ============================================================================

/// Index on every child table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IndexDefinition {
    /// Column list, comma separated
    pub field: String,
    #[serde(default)]
    pub unique: bool,
    /// Index method, e.g. `gin`
    #[serde(default)]
    pub using: Option<String>,
    /// Partial index predicate
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,
}

/// Foreign key on every child table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ForeignKeyDefinition {
    /// Referencing column
    pub field: String,
    /// Referenced table; derived from the column name when absent
    #[serde(default)]
    pub table: Option<String>,
    /// Referenced column
    #[serde(default = "default_references")]
    pub references: String,
}

fn default_references() -> String {
    "id".to_string()
}

// ============================================================================
// Janitorial Definition
// ============================================================================

/// Maintenance window, counted in buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct JanitorialDefinition {
    /// Buckets to create beyond the current one
    #[serde(default)]
    pub create_ahead: u32,
    /// Archive the child table this many buckets back
    #[serde(default)]
    pub archive_after: Option<u32>,
    /// Drop the child table this many buckets back
    #[serde(default)]
    pub drop_after: Option<u32>,
}
