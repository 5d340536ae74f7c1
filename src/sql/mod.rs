//! SQL module
//!
//! Turns resolved partition configuration into PostgreSQL statements.
//!
//! # Overview
//!
//! The SQL module provides:
//! - `Connection` - the database collaborator (execute, select)
//! - `SqlAdapter` - partition DDL and catalog queries for one model
//! - `MemoryConnection` - an in-memory catalog for tests and dry runs
//! - `statements` - statement text builders

mod adapter;
mod connection;
mod memory;
pub mod statements;

pub use adapter::SqlAdapter;
pub use connection::Connection;
pub use memory::{MemoryConnection, TableEntry};
