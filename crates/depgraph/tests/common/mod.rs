//! Shared fixtures for the test targets.

#![allow(dead_code)]

use depgraph::{
    GraphConfig, MemoryBackend, ProjectVersionRef, Relationship, RelationshipGraph,
};
use tempfile::TempDir;

/// Parse a `group:artifact:version` coordinate.
pub fn gav(coordinate: &str) -> ProjectVersionRef {
    ProjectVersionRef::parse(coordinate).unwrap()
}

/// A concrete dependency edge.
pub fn dep(from: &str, to: &str) -> Relationship {
    Relationship::dependency(gav(from), gav(to)).build()
}

/// A dependency edge with an explicit declaration index.
pub fn dep_at(from: &str, to: &str, index: u32) -> Relationship {
    Relationship::dependency(gav(from), gav(to)).index(index).build()
}

/// A graph under test, keeping any temporary directory alive.
pub struct TestGraph {
    pub name: &'static str,
    pub graph: RelationshipGraph,
    _dir: Option<TempDir>,
}

/// One graph per store implementation, all with the same configuration.
pub fn graphs(config: GraphConfig) -> Vec<TestGraph> {
    let mut graphs = vec![
        TestGraph {
            name: "memory-store",
            graph: RelationshipGraph::in_memory_with_config(config.clone()),
            _dir: None,
        },
        TestGraph {
            name: "persistent-memory-backend",
            graph: RelationshipGraph::with_backend(Box::new(MemoryBackend::new()), config.clone()),
            _dir: None,
        },
    ];

    #[cfg(feature = "rocksdb-backend")]
    {
        let dir = TempDir::new().unwrap();
        let graph = RelationshipGraph::open_with_config(dir.path().join("test.graph"), config).unwrap();
        graphs.push(TestGraph {
            name: "persistent-rocksdb",
            graph,
            _dir: Some(dir),
        });
    }

    graphs
}
