//! # depgraph
//!
//! A graph engine for Maven-style project relationships: parents, BOM imports,
//! dependencies, plugins, plugin dependencies and extensions between versioned
//! projects.
//!
//! ## Core Principles
//!
//! - **Views, not snapshots**: every query runs through a [`RelationshipView`]
//!   (roots, filter, mutator, provenance restrictions, version selections)
//! - **Incremental**: view membership is cached and extended as relationships
//!   arrive, never rebuilt on each query
//! - **Cycle-aware**: relationships closing a cycle are detected on insert
//! - **Backend agnostic**: the engine only needs the narrow [`GraphStore`] trait
//!
//! ## Architecture
//!
//! ```text
//! RelationshipGraph (synchronized façade)
//!     ↓
//! ViewMembershipCache / CycleDetector
//!     ↓
//! TraversalEngine (PathState, ordering)
//!     ↓
//! GraphStore (memory multigraph, persistent key/value layout)
//!     ↓
//! StorageBackend (RocksDB, memory)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use depgraph::{ProjectVersionRef, Relationship, RelationshipGraph, RelationshipView};
//!
//! let a = ProjectVersionRef::parse("org.acme:app:1.0").unwrap();
//! let b = ProjectVersionRef::parse("org.acme:lib:2.1").unwrap();
//!
//! let graph = RelationshipGraph::in_memory();
//! graph
//!     .add_relationships([Relationship::dependency(a.clone(), b.clone()).build()])
//!     .unwrap();
//!
//! let view = RelationshipView::rooted([a]);
//! assert!(graph.contains_project(&view, &b).unwrap());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod cycle;
pub mod error;
pub mod export;
pub mod graph;
pub mod membership;
pub mod model;
pub mod storage;
pub mod traversal;
pub mod view;

// Re-export main types
pub use config::{CyclePolicy, GraphConfig};
pub use cycle::{Cycle, CycleDetector};
pub use error::{GraphError, Result};
pub use graph::RelationshipGraph;
pub use model::{
    ArtifactInfo, DependencyScope, ProjectRef, ProjectVersionRef, Relationship, RelationshipId,
    RelationshipType, VersionSpec,
};
pub use storage::{GraphStore, MemoryBackend, MemoryGraphStore, PersistentGraphStore, StorageBackend};
#[cfg(feature = "rocksdb-backend")]
pub use storage::RocksDBBackend;
pub use traversal::{GraphPath, PathState, RelationshipVisitor, TraversalType};
pub use view::{RelationshipFilter, RelationshipMutator, RelationshipView};
