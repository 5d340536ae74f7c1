//! Partition lifecycle: create, archive and drop child tables

use super::types::{BatchReport, InfrastructureOptions};
use crate::error::{PartitionFailure, Result};
use crate::model::Model;
use crate::reader::Configurator;
use crate::sql::{Connection, SqlAdapter};
use crate::types::{display_key_values, KeyValue, KeyValues};
use std::sync::Arc;
use tracing::{info, warn};

/// Drives child table lifecycle for one model
#[derive(Debug, Clone)]
pub struct PartitionManager {
    adapter: SqlAdapter,
}

impl PartitionManager {
    pub fn new(model: Model, connection: Arc<dyn Connection>) -> Self {
        Self {
            adapter: SqlAdapter::new(model, connection),
        }
    }

    pub fn adapter(&self) -> &SqlAdapter {
        &self.adapter
    }

    pub fn model(&self) -> &Model {
        self.adapter.model()
    }

    fn configurator(&self) -> Box<dyn Configurator> {
        self.model().configurator()
    }

    // ========================================================================
    // Schedules
    // ========================================================================

    /// Key values whose child tables should be created now
    pub fn new_partition_key_values_set(&self) -> Result<Vec<KeyValues>> {
        self.configurator().janitorial_creates_needed()
    }

    /// Key values whose child tables should be archived now
    pub fn archive_old_partition_key_values_set(&self) -> Result<Vec<KeyValues>> {
        self.configurator().janitorial_archives_needed()
    }

    /// Key values whose child tables should be dropped now
    pub fn old_partition_key_values_set(&self) -> Result<Vec<KeyValues>> {
        self.configurator().janitorial_drops_needed()
    }

    // ========================================================================
    // Single tuple
    // ========================================================================

    /// Create one child table, then its indexes, then its foreign keys, then
    /// run the after-create hooks
    pub fn create_new_partition(&self, key_values: &[KeyValue]) -> Result<()> {
        self.adapter.create_partition_table(key_values)?;
        self.adapter.add_partition_table_index(key_values)?;
        self.adapter.add_references_to_partition_table(key_values)?;
        self.configurator()
            .run_after_partition_table_create_hooks(key_values, &**self.adapter.connection())?;

        info!(
            model = self.model().name(),
            key_values = %display_key_values(key_values),
            "Created partition"
        );
        Ok(())
    }

    /// Detach one child table from its parent
    pub fn archive_old_partition(&self, key_values: &[KeyValue]) -> Result<()> {
        self.adapter.archive_partition_table(key_values)?;
        info!(
            model = self.model().name(),
            key_values = %display_key_values(key_values),
            "Archived partition"
        );
        Ok(())
    }

    /// Drop one child table
    pub fn drop_old_partition(&self, key_values: &[KeyValue]) -> Result<()> {
        self.adapter.drop_partition_table(key_values)?;
        info!(
            model = self.model().name(),
            key_values = %display_key_values(key_values),
            "Dropped partition"
        );
        Ok(())
    }

    // ========================================================================
    // Batches
    // ========================================================================

    /// Create a child table for every tuple; a failing tuple does not stop
    /// the rest
    pub fn create_new_partition_tables<I, K>(&self, key_values_set: I) -> BatchReport
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[KeyValue]>,
    {
        self.run_batch("create_new_partition_tables", key_values_set, |kv| {
            self.create_new_partition(kv)
        })
    }

    /// Create every child table the creates schedule asks for
    pub fn create_new_partitions(&self) -> Result<BatchReport> {
        let key_values_set = self.new_partition_key_values_set()?;
        Ok(self.run_batch("create_new_partitions", key_values_set, |kv| {
            self.create_new_partition(kv)
        }))
    }

    /// Archive every child table the archives schedule asks for
    pub fn archive_old_partitions(&self) -> Result<BatchReport> {
        let key_values_set = self.archive_old_partition_key_values_set()?;
        Ok(self.run_batch("archive_old_partitions", key_values_set, |kv| {
            self.archive_old_partition(kv)
        }))
    }

    /// Drop every child table the drops schedule asks for
    pub fn drop_old_partitions(&self) -> Result<BatchReport> {
        let key_values_set = self.old_partition_key_values_set()?;
        Ok(self.run_batch("drop_old_partitions", key_values_set, |kv| {
            self.drop_old_partition(kv)
        }))
    }

    fn run_batch<I, K>(
        &self,
        operation: &str,
        key_values_set: I,
        mut step: impl FnMut(&[KeyValue]) -> Result<()>,
    ) -> BatchReport
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[KeyValue]>,
    {
        let mut report = BatchReport::new(operation);
        for key_values in key_values_set {
            let key_values = key_values.as_ref();
            match step(key_values) {
                Ok(()) => report.succeeded.push(key_values.to_vec()),
                Err(error) => {
                    warn!(
                        model = self.model().name(),
                        operation,
                        key_values = %display_key_values(key_values),
                        error = %error,
                        "Partition operation failed, continuing"
                    );
                    report.failures.push(PartitionFailure {
                        key_values: key_values.to_vec(),
                        error,
                    });
                }
            }
        }
        report
    }

    // ========================================================================
    // Infrastructure
    // ========================================================================

    /// Create the child table schema and reject direct inserts into the
    /// parent table
    pub fn create_infrastructure(&self, options: &InfrastructureOptions) -> Result<()> {
        self.adapter.create_partition_schema(options.unless_exists)?;
        self.adapter.add_parent_table_rules()?;
        info!(model = self.model().name(), "Created partition infrastructure");
        Ok(())
    }

    /// Drop the child table schema and the parent's insert rule
    pub fn delete_infrastructure(&self, options: &InfrastructureOptions) -> Result<()> {
        self.adapter
            .drop_partition_schema(options.unless_exists, options.cascade)?;
        self.adapter.remove_parent_table_rules()?;
        info!(model = self.model().name(), "Deleted partition infrastructure");
        Ok(())
    }
}
