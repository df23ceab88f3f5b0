//! Reopening RocksDB-backed graphs.

#![cfg(feature = "rocksdb-backend")]

use crate::common::{dep, gav};
use depgraph::{GraphError, Relationship, RelationshipGraph, RelationshipView};
use tempfile::TempDir;

#[test]
fn test_relationships_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("deps.graph");

    {
        let graph = RelationshipGraph::open(&path).unwrap();
        graph
            .add_relationships([
                Relationship::dependency(gav("g:a:1"), gav("g:b:1"))
                    .source("repo:central")
                    .build(),
                dep("g:b:1", "g:c:1"),
                Relationship::terminus(gav("g:a:1")).build(),
            ])
            .unwrap();
        graph.close().unwrap();
    }

    let graph = RelationshipGraph::open(&path).unwrap();
    let all = graph.all_relationships(&RelationshipView::global()).unwrap();
    assert_eq!(all.len(), 3);

    let view = RelationshipView::rooted([gav("g:a:1")]);
    let declared = graph.relationships_declared_by(&view, &gav("g:a:1")).unwrap();
    assert!(declared[0].is_terminus());
    assert_eq!(declared[1].sources().len(), 1);
    assert!(graph.contains_project(&view, &gav("g:c:1")).unwrap());
}

#[test]
fn test_rejections_hold_after_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("deps.graph");

    {
        let graph = RelationshipGraph::open(&path).unwrap();
        graph
            .add_relationships([dep("g:a:1", "g:b:1"), dep("g:b:1", "g:c:1")])
            .unwrap();
        graph.flush().unwrap();
    }

    let graph = RelationshipGraph::open(&path).unwrap();
    let closing = dep("g:c:1", "g:a:1");
    let rejected = graph.add_relationships([closing.clone()]).unwrap();
    assert!(rejected.contains(&closing));
}

#[test]
fn test_closed_persistent_graph() {
    let dir = TempDir::new().unwrap();
    let graph = RelationshipGraph::open(dir.path().join("deps.graph")).unwrap();
    graph.close().unwrap();
    graph.close().unwrap();
    assert!(matches!(graph.flush(), Err(GraphError::ConnectionClosed)));
}
