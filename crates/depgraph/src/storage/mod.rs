//! Storage abstractions and implementations.
//!
//! Two layers live here:
//!
//! - [`StorageBackend`]: a raw ordered key/value store ([`MemoryBackend`],
//!   [`RocksDBBackend`]).
//! - [`GraphStore`]: the narrow node/edge capability surface the traversal
//!   engine needs. [`MemoryGraphStore`] is an in-memory multigraph;
//!   [`PersistentGraphStore`] lays the same graph out over any
//!   [`StorageBackend`].
//!
//! The engine never looks past [`GraphStore`], so both implementations must
//! produce identical traversal results for identical inserts.

mod memory;
mod memory_store;
mod persistent_store;
#[cfg(feature = "rocksdb-backend")]
mod rocksdb_backend;

pub use memory::MemoryBackend;
pub use memory_store::MemoryGraphStore;
pub use persistent_store::PersistentGraphStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_backend::RocksDBBackend;

use crate::error::Result;
use crate::model::{ProjectRef, ProjectVersionRef, Relationship, RelationshipId};
use serde::{Deserialize, Serialize};

/// Key-value pair for storage operations.
pub type KeyValue = (Vec<u8>, Vec<u8>);

/// Trait defining the raw key/value storage interface.
///
/// All storage operations are explicit and return `Result` to handle failures.
/// Implementations must apply [`StorageBackend::write_batch`] atomically.
pub trait StorageBackend: Send + Sync {
    /// Store a key-value pair.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the write fails.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Retrieve a value by key. Returns `Ok(None)` if the key doesn't exist.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Delete a key-value pair. Idempotent.
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool>;

    /// All key-value pairs whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<KeyValue>>;

    /// Execute a batch of write operations atomically.
    ///
    /// Either all operations succeed or none do.
    fn write_batch(&mut self, operations: Vec<BatchOperation>) -> Result<()>;

    /// Flush any buffered writes to durable storage.
    fn flush(&mut self) -> Result<()>;
}

/// Batch write operation for atomic updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BatchOperation {
    /// Put a key-value pair
    Put {
        /// Key to write
        key: Vec<u8>,
        /// Value to write
        value: Vec<u8>,
    },
    /// Delete a key
    Delete {
        /// Key to delete
        key: Vec<u8>,
    },
}

/// Result of storing a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new logical edge was created.
    Inserted,
    /// An edge with the same logical identity existed; its sources were merged.
    Merged {
        /// Whether the merge added at least one new source.
        widened: bool,
    },
}

/// Node/edge capability surface consumed by the traversal engine.
///
/// Relationships are deduplicated by logical identity: inserting an existing
/// identity unions its `sources` instead of creating a second edge. Both
/// endpoints of every stored relationship are recorded as projects.
pub trait GraphStore: Send {
    /// Store `relationship`, merging sources into an existing logical duplicate.
    fn insert_relationship(&mut self, relationship: &Relationship) -> Result<InsertOutcome>;

    /// Remove the relationship with the same logical identity.
    ///
    /// Returns whether anything was removed. Projects are kept.
    fn remove_relationship(&mut self, relationship: &Relationship) -> Result<bool>;

    /// Look up a stored relationship by id.
    fn relationship(&self, id: RelationshipId) -> Result<Option<Relationship>>;

    /// Whether `project` is a known vertex.
    fn contains_project(&self, project: &ProjectVersionRef) -> Result<bool>;

    /// Relationships declared by `project`.
    fn outgoing(&self, project: &ProjectVersionRef) -> Result<Vec<Relationship>>;

    /// Relationships targeting `project`.
    fn incoming(&self, project: &ProjectVersionRef) -> Result<Vec<Relationship>>;

    /// Every known version of a `group:artifact`.
    fn projects_matching(&self, project: &ProjectRef) -> Result<Vec<ProjectVersionRef>>;

    /// Every known project.
    fn all_projects(&self) -> Result<Vec<ProjectVersionRef>>;

    /// Every stored relationship, ordered by id.
    fn all_relationships(&self) -> Result<Vec<Relationship>>;

    /// Flush pending writes.
    fn flush(&mut self) -> Result<()>;

    /// Whether a relationship with the same logical identity is stored.
    fn contains_relationship(&self, relationship: &Relationship) -> Result<bool> {
        Ok(self.relationship(relationship.id())?.is_some())
    }
}
