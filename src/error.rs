//! Error types for Solidafy Partitioned
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use crate::types::{display_key_values, KeyValues};
use std::fmt;
use thiserror::Error;

/// Whether a missing member is expected on the model itself or on a resolved
/// (per key-value) configuration view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Class-level member, reported as `Model.member`
    Class,
    /// Instance-level member, reported as `Model#member`
    Instance,
}

impl MemberKind {
    fn separator(self) -> char {
        match self {
            MemberKind::Class => '.',
            MemberKind::Instance => '#',
        }
    }
}

/// A single failed tuple inside a batch operation
#[derive(Debug)]
pub struct PartitionFailure {
    /// Key values of the tuple that failed
    pub key_values: KeyValues,
    /// The error raised for that tuple
    pub error: Error,
}

impl fmt::Display for PartitionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: {}", display_key_values(&self.key_values), self.error)
    }
}

/// The main error type for Solidafy Partitioned
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Method not implemented: {model}{}{member}", .kind.separator())]
    MethodNotImplemented {
        model: String,
        member: String,
        kind: MemberKind,
    },

    #[error("'{member}' is not valid for multi-level partitioned model {model}")]
    InvalidForMultiLevel { model: String, member: String },

    #[error("Missing partition key '{field}' in attributes for {model}")]
    MissingPartitionKey { model: String, field: String },

    #[error("'{field}' expects {expected} key value(s), got {actual}")]
    KeyArity {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid partition key value: {message}")]
    InvalidKeyValue { message: String },

    // ============================================================================
    // Resolution Errors
    // ============================================================================
    #[error("Failed to resolve '{field}' for key values [{key_values}]: {source}")]
    Resolution {
        field: String,
        key_values: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Template error: {message}")]
    Template { message: String },

    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable { variable: String },

    // ============================================================================
    // DDL Errors
    // ============================================================================
    #[error("Statement failed ({}): {message}: {statement}", .sqlstate.as_deref().unwrap_or("?"))]
    Ddl {
        statement: String,
        sqlstate: Option<String>,
        message: String,
    },

    #[error("Partition table {table} already exists")]
    PartitionAlreadyExists { table: String },

    #[error("Partition table {table} does not exist")]
    PartitionMissing { table: String },

    #[error("Schema {schema} is not empty (drop with cascade to remove its tables)")]
    SchemaNotEmpty { schema: String },

    #[error("{operation} failed for {} partition(s): {}", .failures.len(), join_failures(.failures))]
    BatchFailed {
        operation: String,
        failures: Vec<PartitionFailure>,
    },

    // ============================================================================
    // Loader Errors
    // ============================================================================
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

fn join_failures(failures: &[PartitionFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing member error
    pub fn not_implemented(
        model: impl Into<String>,
        member: impl Into<String>,
        kind: MemberKind,
    ) -> Self {
        Self::MethodNotImplemented {
            model: model.into(),
            member: member.into(),
            kind,
        }
    }

    /// Create an invalid key value error
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKeyValue {
            message: message.into(),
        }
    }

    /// Create a template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Create a DDL error as reported by the database
    pub fn ddl(
        statement: impl Into<String>,
        sqlstate: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self::Ddl {
            statement: statement.into(),
            sqlstate: sqlstate.map(String::from),
            message: message.into(),
        }
    }

    /// Wrap an error raised while resolving a configuration field.
    ///
    /// Missing members and already-wrapped errors pass through unchanged so
    /// the innermost cause is what callers see.
    pub fn resolution(field: &str, key_values: impl Into<String>, source: Error) -> Self {
        match source {
            Error::MethodNotImplemented { .. } | Error::Resolution { .. } => source,
            other => Self::Resolution {
                field: field.to_string(),
                key_values: key_values.into(),
                source: Box::new(other),
            },
        }
    }

    /// The SQLSTATE reported by the database, if any
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Error::Ddl { sqlstate, .. } => sqlstate.as_deref(),
            _ => None,
        }
    }

    /// Check if this error reports an object that already exists
    pub fn is_already_exists(&self) -> bool {
        match self {
            Error::PartitionAlreadyExists { .. } => true,
            Error::Ddl { .. } => matches!(
                self.sqlstate(),
                Some(
                    sqlstate::DUPLICATE_TABLE
                        | sqlstate::DUPLICATE_SCHEMA
                        | sqlstate::DUPLICATE_OBJECT
                )
            ),
            _ => false,
        }
    }

    /// Check if this error reports an object that does not exist
    pub fn is_missing(&self) -> bool {
        match self {
            Error::PartitionMissing { .. } => true,
            Error::Ddl { .. } => matches!(
                self.sqlstate(),
                Some(
                    sqlstate::UNDEFINED_TABLE
                        | sqlstate::INVALID_SCHEMA_NAME
                        | sqlstate::UNDEFINED_OBJECT
                )
            ),
            _ => false,
        }
    }
}

/// PostgreSQL SQLSTATE codes the adapter distinguishes
pub mod sqlstate {
    /// `duplicate_table`
    pub const DUPLICATE_TABLE: &str = "42P07";
    /// `duplicate_schema`
    pub const DUPLICATE_SCHEMA: &str = "42P06";
    /// `duplicate_object`
    pub const DUPLICATE_OBJECT: &str = "42710";
    /// `undefined_table`
    pub const UNDEFINED_TABLE: &str = "42P01";
    /// `undefined_object`
    pub const UNDEFINED_OBJECT: &str = "42704";
    /// `invalid_schema_name`
    pub const INVALID_SCHEMA_NAME: &str = "3F000";
    /// `dependent_objects_still_exist`
    pub const DEPENDENT_OBJECTS_STILL_EXIST: &str = "2BP01";
    /// `undefined_function`
    pub const UNDEFINED_FUNCTION: &str = "42883";
    /// `raise_exception`
    pub const RAISE_EXCEPTION: &str = "P0001";
}

/// Result type alias for Solidafy Partitioned
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::not_implemented("ByTimeField", "partition_time_field", MemberKind::Class);
        assert_eq!(
            err.to_string(),
            "Method not implemented: ByTimeField.partition_time_field"
        );

        let err = Error::not_implemented("Employee", "check_constraint", MemberKind::Instance);
        assert_eq!(
            err.to_string(),
            "Method not implemented: Employee#check_constraint"
        );
    }

    #[test]
    fn test_resolution_passes_missing_members_through() {
        let inner = Error::not_implemented("ById", "table_name", MemberKind::Class);
        let err = Error::resolution("schema_name", "", inner);
        assert!(matches!(err, Error::MethodNotImplemented { .. }));

        let err = Error::resolution("base_name", "1", Error::undefined_var("model.nope"));
        match err {
            Error::Resolution {
                field, key_values, ..
            } => {
                assert_eq!(field, "base_name");
                assert_eq!(key_values, "1");
            }
            other => panic!("Expected Resolution, got {other:?}"),
        }
    }

    #[test]
    fn test_existence_predicates() {
        let dup = Error::ddl("CREATE TABLE x ()", Some(sqlstate::DUPLICATE_TABLE), "exists");
        assert!(dup.is_already_exists());
        assert!(!dup.is_missing());

        let missing = Error::ddl("DROP TABLE x", Some(sqlstate::UNDEFINED_TABLE), "missing");
        assert!(missing.is_missing());

        assert!(Error::PartitionAlreadyExists { table: "s.p1".into() }.is_already_exists());
        assert!(Error::PartitionMissing { table: "s.p1".into() }.is_missing());
        assert!(!Error::config("x").is_missing());
    }

    #[test]
    fn test_batch_failed_lists_tuples() {
        let err = Error::BatchFailed {
            operation: "create_new_partitions".into(),
            failures: vec![PartitionFailure {
                key_values: vec![1.into()],
                error: Error::PartitionAlreadyExists {
                    table: "employees_partitions.p1".into(),
                },
            }],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("create_new_partitions failed for 1 partition(s)"));
        assert!(msg.contains("[1]: Partition table employees_partitions.p1 already exists"));
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
