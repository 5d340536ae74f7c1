//! Partition manager
//!
//! Lifecycle of child tables: absent → created (indexed, referenced, hooks
//! run) → archived → dropped, plus the schema and parent insert rule they
//! depend on.
//!
//! Batch operations process every tuple and report per-tuple failures
//! instead of stopping at the first one.

mod partition_manager;
mod types;

pub use partition_manager::PartitionManager;
pub use types::{BatchReport, InfrastructureOptions};
