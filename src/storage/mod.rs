//! Storage module for the relay graph
//!
//! This module handles all persistence for the crawler, including:
//! - The `GraphStore` collaborator contract (`execute`, `clean`, `close`)
//! - The declarative statement model emitted by runners
//! - SQLite property-graph storage and schema management
//! - An in-memory store for tests
//! - Read-side queries used for statistics

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryGraphStore;
pub use sqlite::SqliteGraphStore;
pub use traits::{
    GraphQuery, GraphStore, NodeKey, NodeLabel, PropertyValue, RelationKind, Statement,
    StorageError, StorageResult,
};

use std::path::Path;

/// Opens or creates the graph database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteGraphStore)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteGraphStore> {
    SqliteGraphStore::open(path)
}
