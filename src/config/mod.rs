//! Partitioning configuration
//!
//! What a strategy layer declares, and the builder used to declare it.
//!
//! # Overview
//!
//! The config module provides:
//! - `Data` - per-layer settings, collections and schedules
//! - `Setting` / `Entry` - literal, templated or computed values
//! - `Contract` - class-level members (parent table, partition column, ...)
//! - `Dsl` - the builder a `Model::derive` block receives

mod contract;
mod data;
mod dsl;

pub use contract::{Contract, Derived, Member, Normalizer, RangeGenerator};
pub use data::{
    foreign_key_to_foreign_table_name, Data, Entry, Field, ForeignKey, Hook, Index, IndexOptions,
    Resolver, Schedule, Setting, ALL_FIELDS,
};
pub use dsl::Dsl;

#[cfg(test)]
mod tests;
