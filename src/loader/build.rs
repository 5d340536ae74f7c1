//! Turn table definitions into models

use crate::config::{Dsl, ForeignKey, IndexOptions};
use crate::error::Result;
use crate::loader::types::{
    JanitorialDefinition, StrategyDefinition, TableDefinition, TablesDefinition,
};
use crate::model::Model;
use crate::strategy::{self, creates_window, expired_window};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Build the model for a table; janitorial windows are computed from the
/// current UTC date each time they are asked for
pub fn build_model(table: &TableDefinition) -> Result<Model> {
    build_with_clock(table, Arc::new(|| Utc::now().date_naive()))
}

/// Build the model for a table with janitorial windows pinned to `today`
pub fn build_model_on(table: &TableDefinition, today: NaiveDate) -> Result<Model> {
    build_with_clock(table, Arc::new(move || today))
}

/// Build every table's model, in file order
pub fn build_models(def: &TablesDefinition) -> Result<Vec<Model>> {
    def.tables.iter().map(build_model).collect()
}

fn build_with_clock(table: &TableDefinition, clock: Clock) -> Result<Model> {
    let base = match &table.strategy {
        StrategyDefinition::MultiLevel { levels } => {
            let levels = levels
                .iter()
                .enumerate()
                .map(|(i, level)| {
                    builtin(level).derive(format!("{}Level{i}", table.name), |p| {
                        configure_strategy(p, level)
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            return strategy::multi_level().derive(table.name.clone(), |p| {
                p.using_classes(levels);
                configure_table(p, table, &clock);
            });
        }
        other => builtin(other),
    };

    base.derive(table.name.clone(), |p| {
        configure_strategy(p, &table.strategy);
        configure_table(p, table, &clock);
    })
}

fn builtin(strategy: &StrategyDefinition) -> Model {
    match strategy {
        StrategyDefinition::ById { .. } => strategy::by_id(),
        StrategyDefinition::ByIntegerField { .. } => strategy::by_integer_field(),
        StrategyDefinition::ByForeignKey { .. } => strategy::by_foreign_key(),
        StrategyDefinition::ByTimeField { .. } => strategy::by_time_field(),
        StrategyDefinition::ByDailyTimeField { .. } => strategy::by_daily_time_field(),
        StrategyDefinition::ByWeeklyTimeField { .. } => strategy::by_weekly_time_field(),
        StrategyDefinition::ByMonthlyTimeField { .. } => strategy::by_monthly_time_field(),
        StrategyDefinition::ByYearlyTimeField { .. } => strategy::by_yearly_time_field(),
        StrategyDefinition::MultiLevel { .. } => strategy::multi_level(),
    }
}

fn configure_strategy(p: &mut Dsl, strategy: &StrategyDefinition) {
    match strategy {
        StrategyDefinition::ById { table_size } => {
            if let Some(size) = table_size {
                p.table_size(*size);
            }
        }
        StrategyDefinition::ByIntegerField { field, table_size } => {
            p.integer_field(field.as_str());
            if let Some(size) = table_size {
                p.table_size(*size);
            }
        }
        StrategyDefinition::ByForeignKey { field } => {
            p.foreign_key_field(field.as_str());
        }
        StrategyDefinition::ByTimeField { field, bucket } => {
            p.time_field(field.as_str());
            if let Some(bucket) = bucket {
                p.time_bucket(*bucket);
            }
        }
        StrategyDefinition::ByDailyTimeField { field }
        | StrategyDefinition::ByWeeklyTimeField { field }
        | StrategyDefinition::ByMonthlyTimeField { field }
        | StrategyDefinition::ByYearlyTimeField { field } => {
            p.time_field(field.as_str());
        }
        StrategyDefinition::MultiLevel { .. } => {}
    }
}

fn configure_table(p: &mut Dsl, table: &TableDefinition, clock: &Clock) {
    p.model_table_name(table.table_name.as_str());

    if let Some(schema) = &table.schema_name {
        p.schema_name(schema.as_str());
    }
    if let Some(prefix) = &table.name_prefix {
        p.name_prefix(prefix.as_str());
    }
    if let Some(alias) = &table.table_alias_name {
        p.table_alias_name(alias.as_str());
    }
    if let Some(check) = &table.check_constraint {
        p.check_constraint(check.as_str());
    }
    if let Some(order) = &table.order {
        p.order(order.as_str());
    }

    for index in &table.indexes {
        p.index(
            index.field.as_str(),
            IndexOptions {
                unique: index.unique,
                using: index.using.clone(),
                where_clause: index.where_clause.clone(),
            },
        );
    }

    for fk in &table.foreign_keys {
        let mut foreign_key = ForeignKey::new(fk.field.as_str());
        if let Some(referenced) = &fk.table {
            foreign_key.referenced_table = referenced.clone();
        }
        foreign_key.referenced_field = fk.references.clone();
        p.foreign_key(foreign_key);
    }

    if let Some(janitorial) = table.janitorial {
        configure_janitorial(p, janitorial, clock);
    }
}

fn configure_janitorial(p: &mut Dsl, window: JanitorialDefinition, clock: &Clock) {
    let today = clock.clone();
    p.janitorial_creates_needed(move |model| {
        creates_window(model.partition_time_bucket()?, today(), window.create_ahead)
    });

    if let Some(after) = window.archive_after {
        let today = clock.clone();
        p.janitorial_archives_needed(move |model| {
            expired_window(model.partition_time_bucket()?, today(), after)
        });
    }

    if let Some(after) = window.drop_after {
        let today = clock.clone();
        p.janitorial_drops_needed(move |model| {
            expired_window(model.partition_time_bucket()?, today(), after)
        });
    }
}
