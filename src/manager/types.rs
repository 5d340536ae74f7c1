//! Types for partition lifecycle operations

use crate::error::{Error, PartitionFailure, Result};
use crate::types::KeyValues;
use serde::{Deserialize, Serialize};

/// Options for creating and deleting a model's infrastructure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfrastructureOptions {
    /// Tolerate a schema that already exists (create) or is already gone
    /// (delete)
    pub unless_exists: bool,
    /// Drop the schema together with every child table in it
    pub cascade: bool,
}

impl Default for InfrastructureOptions {
    fn default() -> Self {
        Self {
            unless_exists: true,
            cascade: false,
        }
    }
}

impl InfrastructureOptions {
    /// Fail when the schema already exists / is already gone
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.unless_exists = false;
        self
    }

    /// Drop child tables along with the schema
    #[must_use]
    pub fn cascade(mut self) -> Self {
        self.cascade = true;
        self
    }
}

/// Outcome of a batch lifecycle operation
#[derive(Debug)]
pub struct BatchReport {
    /// Operation name, e.g. `create_new_partitions`
    pub operation: String,
    /// Tuples processed successfully, in order
    pub succeeded: Vec<KeyValues>,
    /// Tuples that failed, with their errors
    pub failures: Vec<PartitionFailure>,
}

impl BatchReport {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            succeeded: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Check if every tuple succeeded
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of tuples attempted
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failures.len()
    }

    /// The succeeded tuples, or `BatchFailed` listing every failure
    pub fn into_result(self) -> Result<Vec<KeyValues>> {
        if self.failures.is_empty() {
            Ok(self.succeeded)
        } else {
            Err(Error::BatchFailed {
                operation: self.operation,
                failures: self.failures,
            })
        }
    }
}
