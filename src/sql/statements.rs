//! PostgreSQL statement text for partition DDL and catalog queries

use crate::config::{ForeignKey, Index};
use crate::strategy::sanitize_identifier;

/// Function invoked by the parent table's insert rule
pub const ALWAYS_FAIL_ON_INSERT: &str = "always_fail_on_insert";

/// Default ordering for [`list_partitions`]
pub const DEFAULT_ORDER_BY: &str = "tablename desc";

pub fn create_schema(schema: &str, if_not_exists: bool) -> String {
    if if_not_exists {
        format!("CREATE SCHEMA IF NOT EXISTS {schema}")
    } else {
        format!("CREATE SCHEMA {schema}")
    }
}

pub fn drop_schema(schema: &str, if_exists: bool, cascade: bool) -> String {
    format!(
        "DROP SCHEMA {}{schema}{}",
        if if_exists { "IF EXISTS " } else { "" },
        if cascade { " CASCADE" } else { "" }
    )
}

pub fn create_table(table: &str, check_constraint: &str, parent: &str) -> String {
    format!("CREATE TABLE {table} (\n  CHECK ({check_constraint})\n) INHERITS ({parent})")
}

pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE {table}")
}

pub fn no_inherit(table: &str, parent: &str) -> String {
    format!("ALTER TABLE {table} NO INHERIT {parent}")
}

/// Index named `<part>_<field>_udx` (unique) or `<part>_<field>_idx`
pub fn create_index(table: &str, part: &str, index: &Index) -> String {
    let columns = index.columns();
    let suffix = if index.options.unique { "udx" } else { "idx" };
    let name = format!("{part}_{}_{suffix}", sanitize_identifier(&columns.join("_")));

    let mut sql = format!(
        "CREATE {}INDEX {name} ON {table}",
        if index.options.unique { "UNIQUE " } else { "" }
    );
    if let Some(method) = &index.options.using {
        sql.push_str(&format!(" USING {method}"));
    }
    sql.push_str(&format!(" ({})", columns.join(", ")));
    if let Some(predicate) = &index.options.where_clause {
        sql.push_str(&format!(" WHERE {predicate}"));
    }
    sql
}

/// Constraint named `<part>_<field>_fkey`
pub fn add_foreign_key(table: &str, part: &str, foreign_key: &ForeignKey) -> String {
    format!(
        "ALTER TABLE {table} ADD CONSTRAINT {part}_{field}_fkey FOREIGN KEY ({field}) REFERENCES {} ({})",
        foreign_key.referenced_table,
        foreign_key.referenced_field,
        field = foreign_key.referencing_field,
    )
}

pub fn create_always_fail_function() -> String {
    format!(
        "CREATE OR REPLACE FUNCTION {ALWAYS_FAIL_ON_INSERT}(table_name text) RETURNS boolean AS $$\n\
         BEGIN\n  \
         RAISE EXCEPTION 'partitioned table \"%\" does not support direct inserts, you should be inserting directly into child tables', table_name;\n  \
         RETURN false;\n\
         END;\n\
         $$ LANGUAGE plpgsql"
    )
}

/// Name of the insert rule on a parent table
pub fn insert_rule_name(parent: &str) -> String {
    format!("{}_insert", sanitize_identifier(parent))
}

pub fn create_insert_rule(parent: &str) -> String {
    format!(
        "CREATE OR REPLACE RULE {} AS ON INSERT TO {parent} DO INSTEAD (SELECT {ALWAYS_FAIL_ON_INSERT}({}))",
        insert_rule_name(parent),
        quote_literal(parent)
    )
}

pub fn drop_insert_rule(parent: &str) -> String {
    format!("DROP RULE IF EXISTS {} ON {parent}", insert_rule_name(parent))
}

pub fn table_exists(schema: &str, table: &str) -> String {
    format!(
        "SELECT count(*) FROM pg_tables WHERE schemaname = {} AND tablename = {}",
        quote_literal(schema),
        quote_literal(table)
    )
}

pub fn schema_exists(schema: &str) -> String {
    format!(
        "SELECT count(*) FROM pg_namespace WHERE nspname = {}",
        quote_literal(schema)
    )
}

pub fn list_partitions(schema: &str, order_by: &str, limit: usize) -> String {
    format!(
        "SELECT tablename FROM pg_tables WHERE schemaname = {} ORDER BY {order_by} LIMIT {limit}",
        quote_literal(schema)
    )
}

/// Quote a string literal, doubling embedded quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
