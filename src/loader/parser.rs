//! YAML parser for partitioned table definitions
//!
//! Parses and validates table definition files.

use crate::error::{Error, Result};
use crate::loader::types::{StrategyDefinition, TableDefinition, TablesDefinition};
use crate::template;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Load table definitions from a YAML file
pub fn load_tables(path: impl AsRef<Path>) -> Result<TablesDefinition> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read tables file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_tables_from_str(&content)
}

/// Load table definitions from a YAML string
pub fn load_tables_from_str(yaml: &str) -> Result<TablesDefinition> {
    let def: TablesDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse tables YAML: {e}")))?;

    validate_tables(&def)?;
    Ok(def)
}

/// Validate a definitions file
fn validate_tables(def: &TablesDefinition) -> Result<()> {
    if def.tables.is_empty() {
        return Err(Error::config("At least one table must be defined"));
    }

    let names: HashSet<_> = def.tables.iter().map(|t| &t.name).collect();
    if names.len() != def.tables.len() {
        return Err(Error::config("Duplicate table names found"));
    }

    for table in &def.tables {
        validate_table(table)?;
    }

    Ok(())
}

/// Validate one table definition
fn validate_table(table: &TableDefinition) -> Result<()> {
    if table.name.is_empty() {
        return Err(Error::config("Table name cannot be empty"));
    }

    if table.table_name.is_empty() {
        return Err(Error::config(format!(
            "Table '{}' table_name cannot be empty",
            table.name
        )));
    }

    validate_strategy(&table.name, &table.strategy, false)?;

    if table.janitorial.is_some() && table.strategy.time_bucket().is_none() {
        return Err(Error::config(format!(
            "Table '{}' janitorial window requires a time strategy, got {}",
            table.name,
            table.strategy.kind()
        )));
    }

    let templates = [
        &table.schema_name,
        &table.table_alias_name,
        &table.check_constraint,
    ];
    for value in templates.into_iter().flatten() {
        template::validate(value)
            .map_err(|e| Error::config(format!("Table '{}': {e}", table.name)))?;
    }

    for index in &table.indexes {
        if index.field.trim().is_empty() {
            return Err(Error::config(format!(
                "Table '{}' has an index without a field",
                table.name
            )));
        }
    }

    for fk in &table.foreign_keys {
        if fk.field.is_empty() {
            return Err(Error::config(format!(
                "Table '{}' has a foreign key without a field",
                table.name
            )));
        }
    }

    Ok(())
}

fn validate_strategy(table: &str, strategy: &StrategyDefinition, nested: bool) -> Result<()> {
    match strategy {
        StrategyDefinition::MultiLevel { levels } => {
            if nested {
                return Err(Error::config(format!(
                    "Table '{table}' multi_level levels cannot themselves be multi_level"
                )));
            }
            if levels.len() < 2 {
                return Err(Error::config(format!(
                    "Table '{table}' multi_level needs at least two levels"
                )));
            }
            for level in levels {
                validate_strategy(table, level, true)?;
            }
        }
        StrategyDefinition::ById { table_size }
        | StrategyDefinition::ByIntegerField { table_size, .. } => {
            if matches!(table_size, Some(size) if *size < 1) {
                return Err(Error::config(format!(
                    "Table '{table}' table_size must be positive"
                )));
            }
        }
        _ => {}
    }

    match strategy {
        StrategyDefinition::ByIntegerField { field, .. }
        | StrategyDefinition::ByForeignKey { field }
        | StrategyDefinition::ByTimeField { field, .. }
        | StrategyDefinition::ByDailyTimeField { field }
        | StrategyDefinition::ByWeeklyTimeField { field }
        | StrategyDefinition::ByMonthlyTimeField { field }
        | StrategyDefinition::ByYearlyTimeField { field }
            if field.is_empty() =>
        {
            Err(Error::config(format!(
                "Table '{table}' {} field cannot be empty",
                strategy.kind()
            )))
        }
        _ => Ok(()),
    }
}
