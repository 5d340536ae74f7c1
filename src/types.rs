//! Common types used throughout Solidafy Partitioned
//!
//! This module contains the partition key value type, the request-scoped
//! table reference handed to ORM integrations, and shared type aliases.

use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type, used for record attributes
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// An ordered tuple of partition key values identifying one child table
pub type KeyValues = Vec<KeyValue>;

// ============================================================================
// Key Value
// ============================================================================

/// A single partition key value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    /// Integer column value (ids, foreign keys, integer buckets)
    Integer(i64),
    /// Calendar date
    Date(NaiveDate),
    /// Timestamp without time zone
    Timestamp(NaiveDateTime),
    /// Any other value, kept verbatim
    Text(String),
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
];

impl KeyValue {
    /// Convert a JSON attribute value into a key value.
    ///
    /// Integers stay integers, ISO dates and timestamps are parsed, any
    /// other string is kept as text.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(KeyValue::Integer)
                .ok_or_else(|| Error::invalid_key(format!("not an integer: {n}"))),
            Value::String(s) => Ok(s.parse().unwrap_or_else(|_| KeyValue::Text(s.clone()))),
            Value::Null => Err(Error::invalid_key("null")),
            other => Err(Error::invalid_key(format!("unsupported value: {other}"))),
        }
    }

    /// Integer payload, if this is an integer key
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            KeyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Date payload; timestamps are truncated to their date
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            KeyValue::Date(d) => Some(*d),
            KeyValue::Timestamp(ts) => Some(ts.date()),
            _ => None,
        }
    }

    /// JSON form used by template contexts
    pub fn to_json(&self) -> Value {
        match self {
            KeyValue::Integer(i) => Value::Number((*i).into()),
            other => Value::String(other.to_string()),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Integer(i) => write!(f, "{i}"),
            KeyValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            KeyValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            KeyValue::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for KeyValue {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::invalid_key("empty value"));
        }
        if let Ok(i) = s.parse::<i64>() {
            return Ok(KeyValue::Integer(i));
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
            return Ok(KeyValue::Date(d));
        }
        for fmt in TIMESTAMP_FORMATS {
            if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(KeyValue::Timestamp(ts));
            }
        }
        Err(Error::invalid_key(format!("not an integer, date or timestamp: {s}")))
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Integer(value)
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        KeyValue::Integer(value.into())
    }
}

impl From<NaiveDate> for KeyValue {
    fn from(value: NaiveDate) -> Self {
        KeyValue::Date(value)
    }
}

impl From<NaiveDateTime> for KeyValue {
    fn from(value: NaiveDateTime) -> Self {
        KeyValue::Timestamp(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Text(value.to_string())
    }
}

/// Render key values the way errors and logs show them: `1, 2011-01-05`
pub fn display_key_values(key_values: &[KeyValue]) -> String {
    key_values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Table Reference
// ============================================================================

/// A resolved child table that one statement should address.
///
/// Each INSERT/UPDATE/SELECT gets its own value; nothing shared is mutated
/// when a statement is retargeted at a partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    /// Fully qualified child table name, e.g. `employees_partitions.p42`
    pub name: String,
    /// Alias the query should use for the table, if any
    pub alias: Option<String>,
}

impl TableRef {
    /// Create an unaliased table reference
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// Set the alias
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Name by which columns should be qualified in the statement
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Table expression for a FROM / INTO / UPDATE clause
    pub fn from_clause(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} AS {alias}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.from_clause())
    }
}
