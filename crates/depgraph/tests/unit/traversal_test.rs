//! Unit tests for edge ordering and the traversal engine.

use crate::common::{dep, dep_at, gav};
use depgraph::storage::MemoryGraphStore;
use depgraph::traversal::{ordering, CollectingVisitor, TraversalEngine};
use depgraph::view::RelationshipTypeFilter;
use depgraph::{
    GraphPath, GraphStore, PathState, Relationship, RelationshipType, RelationshipView,
    RelationshipVisitor, TraversalType,
};
use std::collections::HashSet;

fn store_with(rels: &[Relationship]) -> MemoryGraphStore {
    let mut store = MemoryGraphStore::new();
    for rel in rels {
        store.insert_relationship(rel).unwrap();
    }
    store
}

fn run(store: &MemoryGraphStore, view: &RelationshipView, mode: TraversalType) -> CollectingVisitor {
    let mut visitor = CollectingVisitor::default();
    TraversalEngine::new(store, view).traverse(&mut visitor, mode).unwrap();
    visitor
}

#[test]
fn test_sorted_out_edges_is_deterministic() {
    let root = gav("g:a:1");
    let rels = vec![
        dep_at("g:a:1", "g:z:1", 2),
        Relationship::plugin(root.clone(), gav("g:p:1")).build(),
        dep_at("g:a:1", "g:y:1", 1),
        Relationship::parent(root.clone(), gav("g:parent:1")).build(),
        Relationship::bom(root.clone(), gav("g:bom:1")).build(),
        dep_at("g:a:1", "g:x:1", 0),
    ];
    let store = store_with(&rels);
    let view = RelationshipView::global();
    let engine = TraversalEngine::new(&store, &view);

    let first = engine.sorted_out_edges(&root).unwrap();
    let second = engine.sorted_out_edges(&root).unwrap();
    assert_eq!(first, second);

    let order: Vec<&str> = first.iter().map(|r| r.target().artifact_id()).collect();
    assert_eq!(order, vec!["parent", "bom", "x", "y", "z", "p"]);

    let mut shuffled = rels.clone();
    shuffled.reverse();
    ordering::sort_relationships(&mut shuffled);
    assert_eq!(shuffled, first);
}

#[test]
fn test_each_path_visited_once() {
    // diamond: a -> b -> d, a -> c -> d, d -> e
    let store = store_with(&[
        dep_at("g:a:1", "g:b:1", 0),
        dep_at("g:a:1", "g:c:1", 1),
        dep("g:b:1", "g:d:1"),
        dep("g:c:1", "g:d:1"),
        dep("g:d:1", "g:e:1"),
    ]);
    let view = RelationshipView::rooted([gav("g:a:1")]);

    for mode in [TraversalType::DepthFirst, TraversalType::BreadthFirst] {
        let visitor = run(&store, &view, mode);
        let unique: HashSet<&GraphPath> = visitor.paths.iter().collect();
        assert_eq!(unique.len(), visitor.paths.len(), "{mode:?} repeated a path");
        // d -> e is reached along two distinct paths
        let to_e = visitor
            .relationships
            .iter()
            .filter(|r| r.target() == &gav("g:e:1"))
            .count();
        assert_eq!(to_e, 2, "{mode:?}");
    }
}

#[test]
fn test_depth_first_and_breadth_first_cover_same_edges() {
    let store = store_with(&[
        dep_at("g:a:1", "g:b:1", 0),
        dep_at("g:a:1", "g:c:1", 1),
        dep("g:b:1", "g:d:1"),
        dep("g:c:1", "g:e:1"),
        dep("g:e:1", "g:a:1"),
    ]);
    let view = RelationshipView::rooted([gav("g:a:1")]);

    let dfs: HashSet<GraphPath> = run(&store, &view, TraversalType::DepthFirst).paths.into_iter().collect();
    let bfs: HashSet<GraphPath> = run(&store, &view, TraversalType::BreadthFirst).paths.into_iter().collect();
    assert_eq!(dfs, bfs);
    assert_eq!(dfs.len(), 5);
}

#[test]
fn test_terminus_is_reported_not_expanded() {
    let store = store_with(&[
        Relationship::terminus(gav("g:a:1")).build(),
        dep("g:a:1", "g:b:1"),
    ]);
    let view = RelationshipView::rooted([gav("g:a:1")]);
    let visitor = run(&store, &view, TraversalType::DepthFirst);

    assert_eq!(visitor.relationships.len(), 2);
    assert!(visitor.relationships.iter().any(Relationship::is_terminus));
}

#[test]
fn test_filter_scoping_at_depth() {
    let store = store_with(&[
        dep("g:a:1", "g:b:1"),
        Relationship::plugin(gav("g:a:1"), gav("g:p:1")).build(),
        Relationship::plugin(gav("g:b:1"), gav("g:q:1")).build(),
        dep("g:b:1", "g:c:1"),
    ]);
    let view = RelationshipView::builder()
        .root(gav("g:a:1"))
        .filter(RelationshipTypeFilter::new([RelationshipType::Dependency]))
        .build();

    let visitor = run(&store, &view, TraversalType::BreadthFirst);
    assert_eq!(visitor.relationships.len(), 2);
    assert!(visitor
        .relationships
        .iter()
        .all(|r| r.kind() == RelationshipType::Dependency));
}

#[test]
fn test_visitor_receives_child_state() {
    struct States(Vec<PathState>);
    impl RelationshipVisitor for States {
        fn edge_traversed(&mut self, _rel: &Relationship, _path: &GraphPath, state: &PathState) {
            self.0.push(state.clone());
        }
    }

    let store = store_with(&[dep("g:a:1", "g:b:1"), dep("g:b:1", "g:c:1")]);
    let view = RelationshipView::rooted([gav("g:a:1")]);
    let mut visitor = States(Vec::new());
    TraversalEngine::new(&store, &view)
        .traverse(&mut visitor, TraversalType::DepthFirst)
        .unwrap();

    // an unfiltered view keeps its root state along every path
    assert_eq!(visitor.0.len(), 2);
    assert!(visitor.0.iter().all(|s| s.is_same_instance(view.root_state())));
}
