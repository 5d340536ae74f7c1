//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::error::{Error, Result};
use crate::loader::{build_model, build_model_on, build_models, load_tables, TablesDefinition};
use crate::manager::{InfrastructureOptions, PartitionManager};
use crate::model::Model;
use crate::reader::Configurator;
use crate::sql::{statements, Connection, MemoryConnection};
use crate::strategy::{sanitize_identifier, split_qualified};
use crate::types::{display_key_values, KeyValues};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Validate => self.validate(),
            Commands::Names { table, keys } => self.names(table, keys),
            Commands::Plan { table, keys, today } => self.plan(table, keys, *today),
            Commands::Schedule { table, today } => self.schedule(table, *today),
        }
    }

    /// Load table definitions
    fn load_tables(&self) -> Result<TablesDefinition> {
        debug!(path = %self.cli.tables.display(), "Loading table definitions");
        load_tables(&self.cli.tables)
    }

    /// Build the model for one table
    fn load_model(&self, table: &str, today: Option<NaiveDate>) -> Result<Model> {
        let def = self.load_tables()?;
        let table_def = def.find(table).ok_or_else(|| {
            let known: Vec<&str> = def.tables.iter().map(|t| t.name.as_str()).collect();
            Error::config(format!(
                "Table '{table}' not found. Defined tables: {}",
                known.join(", ")
            ))
        })?;
        match today {
            Some(today) => build_model_on(table_def, today),
            None => build_model(table_def),
        }
    }

    fn parse_keys(keys: &[String]) -> Result<KeyValues> {
        keys.iter().map(|k| k.parse()).collect()
    }

    /// Validate table definitions
    fn validate(&self) -> Result<()> {
        let def = self.load_tables()?;
        build_models(&def)?;

        let tables: Vec<Value> = def
            .tables
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "table_name": t.table_name,
                    "strategy": t.strategy.kind(),
                })
            })
            .collect();

        self.output_message(&json!({
            "valid": true,
            "tables": tables,
        }));
        Ok(())
    }

    /// Show resolved names for one set of key values
    fn names(&self, table: &str, keys: &[String]) -> Result<()> {
        let model = self.load_model(table, None)?;
        let key_values = Self::parse_keys(keys)?;
        let c = model.configurator();

        let mut out = json!({
            "model": model.name(),
            "ancestors": model.ancestor_names(),
            "on_fields": c.on_fields()?,
            "schema_name": c.schema_name()?,
            "parent_table_name": c.parent_table_name(&key_values)?,
            "parent_table_schema_name": c.parent_table_schema_name(&key_values)?,
        });

        if !key_values.is_empty() {
            out["key_values"] = json!(display_key_values(&key_values));
            out["base_name"] = json!(c.base_name(&key_values)?);
            out["table_name"] = json!(c.table_name(&key_values)?);
            out["table_alias_name"] = json!(sanitize_identifier(&c.table_alias_name(&key_values)?));
            out["check_constraint"] = json!(c.check_constraint(&key_values)?);
            out["indexes"] = serde_json::to_value(c.indexes(&key_values)?)?;
            out["foreign_keys"] = serde_json::to_value(c.foreign_keys(&key_values)?)?;
        }

        self.output_message(&out);
        Ok(())
    }

    /// Dry-run infrastructure and partition creation
    fn plan(&self, table: &str, keys: &[String], today: Option<NaiveDate>) -> Result<()> {
        let model = self.load_model(table, today)?;
        let configurator = model.configurator();

        let key_values_set = if keys.is_empty() {
            configurator.janitorial_creates_needed()?
        } else {
            vec![Self::parse_keys(keys)?]
        };

        // Multi-level children need every outer level's table first
        let mut steps: Vec<KeyValues> = Vec::new();
        for key_values in &key_values_set {
            let depth = if model.is_multi_level() { 1 } else { key_values.len() };
            for n in depth..=key_values.len() {
                let step = key_values[..n].to_vec();
                if !steps.contains(&step) {
                    steps.push(step);
                }
            }
        }

        let connection = Arc::new(MemoryConnection::new());
        seed_catalog(connection.as_ref(), &model, configurator.as_ref(), &steps)?;
        connection.clear_statements();

        let manager = PartitionManager::new(model, connection.clone());
        manager.create_infrastructure(&InfrastructureOptions::default())?;
        let report = manager.create_new_partition_tables(&steps);

        let failures: Vec<Value> = report
            .failures
            .iter()
            .map(|f| json!(f.to_string()))
            .collect();

        self.output_message(&json!({
            "model": manager.model().name(),
            "partitions": steps.iter().map(|kv| display_key_values(kv)).collect::<Vec<_>>(),
            "statements": connection.statements(),
            "failures": failures,
        }));

        report.into_result().map(|_| ())
    }

    /// Show janitorial schedules
    fn schedule(&self, table: &str, today: Option<NaiveDate>) -> Result<()> {
        let model = self.load_model(table, today)?;
        let c = model.configurator();

        let render = |set: Vec<KeyValues>| -> Vec<String> {
            set.iter().map(|kv| display_key_values(kv)).collect()
        };

        self.output_message(&json!({
            "model": model.name(),
            "creates": render(c.janitorial_creates_needed()?),
            "archives": render(c.janitorial_archives_needed()?),
            "drops": render(c.janitorial_drops_needed()?),
        }));
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Give the in-memory catalog the parent and referenced tables a plan needs
fn seed_catalog(
    connection: &MemoryConnection,
    model: &Model,
    configurator: &dyn Configurator,
    steps: &[KeyValues],
) -> Result<()> {
    let mut tables = vec![model.table_name()?];
    for key_values in steps {
        for fk in configurator.foreign_keys(key_values)? {
            if !tables.contains(&fk.referenced_table) {
                tables.push(fk.referenced_table);
            }
        }
    }

    for table in tables {
        let (schema, _) = split_qualified(&table);
        connection.execute(&statements::create_schema(schema, true))?;
        connection.execute(&format!("CREATE TABLE IF NOT EXISTS {table} ()"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::types::KeyValue;
    use clap::Parser;
    use std::io::Write;

    const TABLES: &str = r#"
tables:
  - name: Employee
    table_name: employees
    strategy:
      type: by_foreign_key
      field: company_id
  - name: Event
    table_name: events
    strategy:
      type: by_monthly_time_field
      field: created_at
    janitorial:
      create_ahead: 1
      drop_after: 6
"#;

    fn runner(file: &tempfile::NamedTempFile, args: &[&str]) -> Runner {
        let path = file.path().to_string_lossy().to_string();
        let mut argv = vec!["solidafy-partitioned", "--tables", path.as_str()];
        argv.extend_from_slice(args);
        Runner::new(Cli::parse_from(argv))
    }

    fn tables_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TABLES.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_commands_run() {
        let file = tables_file();
        runner(&file, &["validate"]).run().unwrap();
        runner(&file, &["names", "--table", "Employee", "--key", "3"])
            .run()
            .unwrap();
        runner(&file, &["plan", "--table", "employees", "-k", "3", "-k", "4"])
            .run()
            .unwrap_err();
        runner(&file, &["plan", "--table", "Employee", "-k", "3"])
            .run()
            .unwrap();
        runner(&file, &["plan", "--table", "Event", "--today", "2024-05-17"])
            .run()
            .unwrap();
        runner(&file, &["schedule", "--table", "Event", "--today", "2024-05-17"])
            .run()
            .unwrap();
    }

    #[test]
    fn test_unknown_table() {
        let file = tables_file();
        let err = runner(&file, &["names", "--table", "Nope"]).run().unwrap_err();
        assert!(err.to_string().contains("Defined tables: Employee, Event"));
    }

    #[test]
    fn test_bad_key() {
        let file = tables_file();
        let err = runner(&file, &["names", "--table", "Employee", "--key", "abc"])
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidKeyValue { .. }));
    }

    #[test]
    fn test_parse_keys() {
        let keys = vec!["1".to_string(), "2011-10-10".to_string()];
        let parsed = Runner::parse_keys(&keys).unwrap();
        assert_eq!(parsed[0], KeyValue::Integer(1));
        assert_eq!(
            parsed[1],
            KeyValue::Date(NaiveDate::from_ymd_opt(2011, 10, 10).unwrap())
        );
    }
}
