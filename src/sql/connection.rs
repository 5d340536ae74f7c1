//! Database connection abstraction

use crate::error::Result;
use std::sync::Arc;

/// The statements a partition manager needs from a database.
///
/// Failures are reported as [`Error::Ddl`](crate::Error::Ddl) carrying the
/// SQLSTATE so the adapter can tell "already exists" from "missing".
pub trait Connection: Send + Sync {
    /// Execute a statement that returns no rows
    fn execute(&self, statement: &str) -> Result<()>;

    /// Run a query and return the first column of every row as text
    fn select_values(&self, query: &str) -> Result<Vec<String>>;
}

impl<C: Connection + ?Sized> Connection for Arc<C> {
    fn execute(&self, statement: &str) -> Result<()> {
        (**self).execute(statement)
    }

    fn select_values(&self, query: &str) -> Result<Vec<String>> {
        (**self).select_values(query)
    }
}

impl<C: Connection + ?Sized> Connection for &C {
    fn execute(&self, statement: &str) -> Result<()> {
        (**self).execute(statement)
    }

    fn select_values(&self, query: &str) -> Result<Vec<String>> {
        (**self).select_values(query)
    }
}
