//! In-memory catalog connection
//!
//! Interprets the statements [`SqlAdapter`](super::SqlAdapter) issues against
//! a small model of the PostgreSQL catalog: schemas, tables with their
//! inheritance parent and CHECK constraint, indexes, foreign keys, insert
//! rules and functions. Errors carry the SQLSTATE PostgreSQL would report.
//! Every statement is recorded, which makes it usable for dry runs.
//!
//! Unqualified names resolve to `public`; identifiers are case-folded.
//! Statements it does not understand are recorded and accepted.

use super::connection::Connection;
use crate::error::{sqlstate, Error, Result};
use regex::{Captures, Regex};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

macro_rules! statement_regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($pattern).unwrap());
    };
}

statement_regex!(CREATE_SCHEMA, r"(?is)^CREATE\s+SCHEMA\s+(IF\s+NOT\s+EXISTS\s+)?(\w+)$");
statement_regex!(
    DROP_SCHEMA,
    r"(?is)^DROP\s+SCHEMA\s+(IF\s+EXISTS\s+)?(\w+)(\s+CASCADE)?$"
);
statement_regex!(
    CREATE_TABLE,
    r"(?is)^CREATE\s+TABLE\s+(IF\s+NOT\s+EXISTS\s+)?([\w.]+)\s*\((.*?)\)\s*(?:INHERITS\s*\(\s*([\w.]+)\s*\))?$"
);
statement_regex!(CHECK_CLAUSE, r"(?is)CHECK\s*\((.*)\)");
statement_regex!(
    DROP_TABLE,
    r"(?is)^DROP\s+TABLE\s+(IF\s+EXISTS\s+)?([\w.]+)(\s+CASCADE)?$"
);
statement_regex!(
    CREATE_INDEX,
    r"(?is)^CREATE\s+(UNIQUE\s+)?INDEX\s+(\w+)\s+ON\s+([\w.]+)"
);
statement_regex!(
    ADD_FOREIGN_KEY,
    r"(?is)^ALTER\s+TABLE\s+([\w.]+)\s+ADD\s+CONSTRAINT\s+(\w+)\s+FOREIGN\s+KEY\s*\(\s*(\w+)\s*\)\s*REFERENCES\s+([\w.]+)\s*\(\s*(\w+)\s*\)$"
);
statement_regex!(
    NO_INHERIT,
    r"(?is)^ALTER\s+TABLE\s+([\w.]+)\s+NO\s+INHERIT\s+([\w.]+)$"
);
statement_regex!(
    CREATE_FUNCTION,
    r"(?is)^CREATE\s+(?:OR\s+REPLACE\s+)?FUNCTION\s+(\w+)\s*\("
);
statement_regex!(
    CREATE_RULE,
    r"(?is)^CREATE\s+(OR\s+REPLACE\s+)?RULE\s+(\w+)\s+AS\s+ON\s+INSERT\s+TO\s+([\w.]+)\s+DO\s+INSTEAD\s*\(\s*SELECT\s+(\w+)\s*\("
);
statement_regex!(
    DROP_RULE,
    r"(?is)^DROP\s+RULE\s+(IF\s+EXISTS\s+)?(\w+)\s+ON\s+([\w.]+)$"
);
statement_regex!(INSERT, r"(?is)^INSERT\s+INTO\s+([\w.]+)");
statement_regex!(
    TABLE_COUNT,
    r"(?is)^SELECT\s+count\(\*\)\s+FROM\s+pg_tables\s+WHERE\s+schemaname\s*=\s*'([^']*)'\s+AND\s+tablename\s*=\s*'([^']*)'$"
);
statement_regex!(
    SCHEMA_COUNT,
    r"(?is)^SELECT\s+count\(\*\)\s+FROM\s+pg_namespace\s+WHERE\s+nspname\s*=\s*'([^']*)'$"
);
statement_regex!(
    TABLE_LIST,
    r"(?is)^SELECT\s+tablename\s+FROM\s+pg_tables\s+WHERE\s+schemaname\s*=\s*'([^']*)'\s+ORDER\s+BY\s+(.+?)(?:\s+LIMIT\s+(\d+))?$"
);

/// A table in the in-memory catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableEntry {
    /// Qualified parent table, when inheriting
    pub parent: Option<String>,
    /// CHECK constraint body
    pub check: Option<String>,
    /// Index names
    pub indexes: Vec<String>,
    /// Foreign key constraints: name → referenced table
    pub foreign_keys: BTreeMap<String, String>,
    /// Insert rules: name → function called
    pub rules: BTreeMap<String, String>,
    /// Rows inserted
    pub rows: usize,
}

#[derive(Debug, Default)]
struct Catalog {
    schemas: BTreeSet<String>,
    tables: BTreeMap<String, TableEntry>,
    functions: BTreeSet<String>,
    statements: Vec<String>,
}

/// Connection backed by an in-memory catalog
#[derive(Debug)]
pub struct MemoryConnection {
    catalog: Mutex<Catalog>,
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConnection {
    /// Empty catalog with the `public` schema
    pub fn new() -> Self {
        let mut catalog = Catalog::default();
        catalog.schemas.insert("public".to_string());
        Self {
            catalog: Mutex::new(catalog),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Catalog> {
        self.catalog.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every statement received, in order
    pub fn statements(&self) -> Vec<String> {
        self.lock().statements.clone()
    }

    /// Forget recorded statements, keeping the catalog
    pub fn clear_statements(&self) {
        self.lock().statements.clear();
    }

    pub fn has_schema(&self, schema: &str) -> bool {
        self.lock().schemas.contains(&schema.to_lowercase())
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.lock().tables.contains_key(&qualify(table))
    }

    /// Catalog entry for a table
    pub fn table(&self, table: &str) -> Option<TableEntry> {
        self.lock().tables.get(&qualify(table)).cloned()
    }

    /// Unqualified names of the tables in a schema, sorted
    pub fn table_names(&self, schema: &str) -> Vec<String> {
        let prefix = format!("{}.", schema.to_lowercase());
        self.lock()
            .tables
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix).map(String::from))
            .collect()
    }
}

impl Connection for MemoryConnection {
    fn execute(&self, statement: &str) -> Result<()> {
        let mut catalog = self.lock();
        catalog.statements.push(statement.to_string());
        catalog.apply(normalize_statement(statement), statement)
    }

    fn select_values(&self, query: &str) -> Result<Vec<String>> {
        let mut catalog = self.lock();
        catalog.statements.push(query.to_string());
        catalog.query(normalize_statement(query), query)
    }
}

// ============================================================================
// Statement interpretation
// ============================================================================

fn normalize_statement(statement: &str) -> &str {
    statement.trim().trim_end_matches(';').trim_end()
}

/// `employees` → `public.employees`, case-folded
fn qualify(name: &str) -> String {
    let name = name.to_lowercase();
    if name.contains('.') {
        name
    } else {
        format!("public.{name}")
    }
}

fn schema_of(qualified: &str) -> &str {
    qualified.split_once('.').map_or("public", |(schema, _)| schema)
}

fn group<'a>(caps: &'a Captures<'_>, i: usize) -> &'a str {
    caps.get(i).map_or("", |m| m.as_str())
}

fn failure(statement: &str, code: &str, message: String) -> Error {
    Error::ddl(statement, Some(code), message)
}

impl Catalog {
    fn apply(&mut self, sql: &str, original: &str) -> Result<()> {
        if let Some(caps) = CREATE_SCHEMA.captures(sql) {
            return self.create_schema(&caps, original);
        }
        if let Some(caps) = DROP_SCHEMA.captures(sql) {
            return self.drop_schema(&caps, original);
        }
        if let Some(caps) = CREATE_TABLE.captures(sql) {
            return self.create_table(&caps, original);
        }
        if let Some(caps) = DROP_TABLE.captures(sql) {
            return self.drop_table(&caps, original);
        }
        if let Some(caps) = CREATE_INDEX.captures(sql) {
            return self.create_index(&caps, original);
        }
        if let Some(caps) = ADD_FOREIGN_KEY.captures(sql) {
            return self.add_foreign_key(&caps, original);
        }
        if let Some(caps) = NO_INHERIT.captures(sql) {
            return self.no_inherit(&caps, original);
        }
        if let Some(caps) = CREATE_FUNCTION.captures(sql) {
            self.functions.insert(group(&caps, 1).to_lowercase());
            return Ok(());
        }
        if let Some(caps) = CREATE_RULE.captures(sql) {
            return self.create_rule(&caps, original);
        }
        if let Some(caps) = DROP_RULE.captures(sql) {
            return self.drop_rule(&caps, original);
        }
        if let Some(caps) = INSERT.captures(sql) {
            return self.insert(&caps, original);
        }
        Ok(())
    }

    fn query(&self, sql: &str, original: &str) -> Result<Vec<String>> {
        if let Some(caps) = TABLE_COUNT.captures(sql) {
            let table = format!("{}.{}", group(&caps, 1), group(&caps, 2)).to_lowercase();
            let count = usize::from(self.tables.contains_key(&table));
            return Ok(vec![count.to_string()]);
        }
        if let Some(caps) = SCHEMA_COUNT.captures(sql) {
            let count = usize::from(self.schemas.contains(&group(&caps, 1).to_lowercase()));
            return Ok(vec![count.to_string()]);
        }
        if let Some(caps) = TABLE_LIST.captures(sql) {
            return Ok(self.list_tables(&caps));
        }
        Err(failure(
            original,
            "42601",
            "query not supported by the in-memory catalog".to_string(),
        ))
    }

    fn require_table(&self, table: &str, statement: &str) -> Result<()> {
        if self.tables.contains_key(table) {
            Ok(())
        } else {
            Err(failure(
                statement,
                sqlstate::UNDEFINED_TABLE,
                format!("relation \"{table}\" does not exist"),
            ))
        }
    }

    fn create_schema(&mut self, caps: &Captures<'_>, statement: &str) -> Result<()> {
        let schema = group(caps, 2).to_lowercase();
        if !self.schemas.insert(schema.clone()) && caps.get(1).is_none() {
            return Err(failure(
                statement,
                sqlstate::DUPLICATE_SCHEMA,
                format!("schema \"{schema}\" already exists"),
            ));
        }
        Ok(())
    }

    fn drop_schema(&mut self, caps: &Captures<'_>, statement: &str) -> Result<()> {
        let schema = group(caps, 2).to_lowercase();
        if !self.schemas.contains(&schema) {
            if caps.get(1).is_some() {
                return Ok(());
            }
            return Err(failure(
                statement,
                sqlstate::INVALID_SCHEMA_NAME,
                format!("schema \"{schema}\" does not exist"),
            ));
        }

        let members: Vec<String> = self
            .tables
            .keys()
            .filter(|t| schema_of(t) == schema)
            .cloned()
            .collect();
        if !members.is_empty() && caps.get(3).is_none() {
            return Err(failure(
                statement,
                sqlstate::DEPENDENT_OBJECTS_STILL_EXIST,
                format!("cannot drop schema {schema} because other objects depend on it"),
            ));
        }
        for table in members {
            self.remove_table_cascade(&table);
        }
        self.schemas.remove(&schema);
        Ok(())
    }

    fn create_table(&mut self, caps: &Captures<'_>, statement: &str) -> Result<()> {
        let table = qualify(group(caps, 2));
        let schema = schema_of(&table).to_string();
        if !self.schemas.contains(&schema) {
            return Err(failure(
                statement,
                sqlstate::INVALID_SCHEMA_NAME,
                format!("schema \"{schema}\" does not exist"),
            ));
        }
        if self.tables.contains_key(&table) {
            if caps.get(1).is_some() {
                return Ok(());
            }
            return Err(failure(
                statement,
                sqlstate::DUPLICATE_TABLE,
                format!("relation \"{table}\" already exists"),
            ));
        }

        let parent = caps.get(4).map(|m| qualify(m.as_str()));
        if let Some(parent) = &parent {
            self.require_table(parent, statement)?;
        }
        let check = CHECK_CLAUSE
            .captures(group(caps, 3))
            .map(|c| group(&c, 1).trim().to_string());

        self.tables.insert(
            table,
            TableEntry {
                parent,
                check,
                ..Default::default()
            },
        );
        Ok(())
    }

    fn drop_table(&mut self, caps: &Captures<'_>, statement: &str) -> Result<()> {
        let table = qualify(group(caps, 2));
        if !self.tables.contains_key(&table) {
            if caps.get(1).is_some() {
                return Ok(());
            }
            return self.require_table(&table, statement);
        }
        let has_dependents = self.tables.iter().any(|(name, entry)| {
            *name != table
                && (entry.parent.as_deref() == Some(table.as_str())
                    || entry.foreign_keys.values().any(|r| *r == table))
        });
        if has_dependents && caps.get(3).is_none() {
            return Err(failure(
                statement,
                sqlstate::DEPENDENT_OBJECTS_STILL_EXIST,
                format!("cannot drop table {table} because other objects depend on it"),
            ));
        }
        self.remove_table_cascade(&table);
        Ok(())
    }

    fn remove_table_cascade(&mut self, table: &str) {
        if self.tables.remove(table).is_none() {
            return;
        }
        let children: Vec<String> = self
            .tables
            .iter()
            .filter(|(_, entry)| entry.parent.as_deref() == Some(table))
            .map(|(name, _)| name.clone())
            .collect();
        for child in children {
            self.remove_table_cascade(&child);
        }
        for entry in self.tables.values_mut() {
            entry.foreign_keys.retain(|_, referenced| referenced.as_str() != table);
        }
    }

    fn create_index(&mut self, caps: &Captures<'_>, statement: &str) -> Result<()> {
        let name = group(caps, 2).to_lowercase();
        let table = qualify(group(caps, 3));
        self.require_table(&table, statement)?;

        let schema = schema_of(&table).to_string();
        let taken = self
            .tables
            .iter()
            .filter(|(t, _)| schema_of(t) == schema)
            .any(|(_, entry)| entry.indexes.contains(&name));
        if taken {
            return Err(failure(
                statement,
                sqlstate::DUPLICATE_TABLE,
                format!("relation \"{name}\" already exists"),
            ));
        }
        if let Some(entry) = self.tables.get_mut(&table) {
            entry.indexes.push(name);
        }
        Ok(())
    }

    fn add_foreign_key(&mut self, caps: &Captures<'_>, statement: &str) -> Result<()> {
        let table = qualify(group(caps, 1));
        let name = group(caps, 2).to_lowercase();
        let referenced = qualify(group(caps, 4));
        self.require_table(&table, statement)?;
        self.require_table(&referenced, statement)?;

        let Some(entry) = self.tables.get_mut(&table) else {
            return Ok(());
        };
        if entry.foreign_keys.contains_key(&name) {
            return Err(failure(
                statement,
                sqlstate::DUPLICATE_OBJECT,
                format!("constraint \"{name}\" for relation \"{table}\" already exists"),
            ));
        }
        entry.foreign_keys.insert(name, referenced);
        Ok(())
    }

    fn no_inherit(&mut self, caps: &Captures<'_>, statement: &str) -> Result<()> {
        let table = qualify(group(caps, 1));
        let parent = qualify(group(caps, 2));
        self.require_table(&table, statement)?;
        self.require_table(&parent, statement)?;

        let Some(entry) = self.tables.get_mut(&table) else {
            return Ok(());
        };
        if entry.parent.as_deref() != Some(parent.as_str()) {
            return Err(failure(
                statement,
                sqlstate::UNDEFINED_TABLE,
                format!("relation \"{parent}\" is not a parent of relation \"{table}\""),
            ));
        }
        entry.parent = None;
        Ok(())
    }

    fn create_rule(&mut self, caps: &Captures<'_>, statement: &str) -> Result<()> {
        let name = group(caps, 2).to_lowercase();
        let table = qualify(group(caps, 3));
        let function = group(caps, 4).to_lowercase();
        self.require_table(&table, statement)?;

        let Some(entry) = self.tables.get_mut(&table) else {
            return Ok(());
        };
        if entry.rules.contains_key(&name) && caps.get(1).is_none() {
            return Err(failure(
                statement,
                sqlstate::DUPLICATE_OBJECT,
                format!("rule \"{name}\" for relation \"{table}\" already exists"),
            ));
        }
        entry.rules.insert(name, function);
        Ok(())
    }

    fn drop_rule(&mut self, caps: &Captures<'_>, statement: &str) -> Result<()> {
        let if_exists = caps.get(1).is_some();
        let name = group(caps, 2).to_lowercase();
        let table = qualify(group(caps, 3));

        let Some(entry) = self.tables.get_mut(&table) else {
            if if_exists {
                return Ok(());
            }
            return self.require_table(&table, statement);
        };
        if entry.rules.remove(&name).is_none() && !if_exists {
            return Err(failure(
                statement,
                sqlstate::UNDEFINED_OBJECT,
                format!("rule \"{name}\" for relation \"{table}\" does not exist"),
            ));
        }
        Ok(())
    }

    fn insert(&mut self, caps: &Captures<'_>, statement: &str) -> Result<()> {
        let table = qualify(group(caps, 1));
        self.require_table(&table, statement)?;

        let function = self
            .tables
            .get(&table)
            .and_then(|entry| entry.rules.values().next().cloned());
        if let Some(function) = function {
            if !self.functions.contains(&function) {
                return Err(failure(
                    statement,
                    sqlstate::UNDEFINED_FUNCTION,
                    format!("function {function}(unknown) does not exist"),
                ));
            }
            return Err(failure(
                statement,
                sqlstate::RAISE_EXCEPTION,
                format!(
                    "partitioned table \"{table}\" does not support direct inserts, you should be inserting directly into child tables"
                ),
            ));
        }
        if let Some(entry) = self.tables.get_mut(&table) {
            entry.rows += 1;
        }
        Ok(())
    }

    fn list_tables(&self, caps: &Captures<'_>) -> Vec<String> {
        let schema = group(caps, 1).to_lowercase();
        let order_by = group(caps, 2).to_lowercase();
        let limit = caps
            .get(3)
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .unwrap_or(usize::MAX);

        let prefix = format!("{schema}.");
        let mut names: Vec<String> = self
            .tables
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix).map(String::from))
            .collect();

        // substring(tablename, N)::integer orders on the numeric suffix
        if order_by.contains("::integer") {
            names.sort_by_key(|name| {
                name.chars()
                    .skip(1)
                    .collect::<String>()
                    .parse::<i64>()
                    .unwrap_or(i64::MIN)
            });
        } else {
            names.sort();
        }
        if order_by.trim_end().ends_with("desc") {
            names.reverse();
        }
        names.truncate(limit);
        names
    }
}
