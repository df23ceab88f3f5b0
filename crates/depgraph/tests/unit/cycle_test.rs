//! Unit tests for cycle identity and detection.

use crate::common::{dep, gav};
use depgraph::storage::MemoryGraphStore;
use depgraph::{Cycle, CycleDetector, GraphStore, RelationshipView};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn hash_of(cycle: &Cycle) -> u64 {
    let mut hasher = DefaultHasher::new();
    cycle.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn test_rotations_compare_and_hash_equal() {
    let ab = dep("g:a:1", "g:b:1");
    let bc = dep("g:b:1", "g:c:1");
    let ca = dep("g:c:1", "g:a:1");

    let one = Cycle::new(vec![ab.clone(), bc.clone(), ca.clone()]).unwrap();
    let two = Cycle::new(vec![bc, ca, ab]).unwrap();
    assert_eq!(one, two);
    assert_eq!(hash_of(&one), hash_of(&two));
    assert_eq!(one.relationships(), two.relationships());
}

#[test]
fn test_cycle_closure_from_candidate() {
    let mut store = MemoryGraphStore::new();
    store.insert_relationship(&dep("g:a:1", "g:b:1")).unwrap();
    store.insert_relationship(&dep("g:b:1", "g:c:1")).unwrap();
    let view = RelationshipView::global();
    let detector = CycleDetector::new(&store, &view);

    let candidate = dep("g:c:1", "g:a:1");
    assert!(detector.introduces_cycle(&candidate).unwrap());

    let cycles = detector.cycles_through(&candidate).unwrap();
    assert_eq!(cycles.len(), 1);
    let cycle = cycles.iter().next().unwrap();
    let rels = cycle.relationships();
    assert_eq!(rels.first().unwrap().declaring(), rels.last().unwrap().target());
    assert!(cycle.contains(&candidate));
    assert!(cycle.contains_project(&gav("g:a:1")));
    assert_eq!(cycle.len(), 3);

    // read as a walk from A, the cycle starts and ends at A
    let a = gav("g:a:1");
    let walk = cycle.walk_from(&a).unwrap();
    assert_eq!(walk.first().unwrap().declaring(), &a);
    assert_eq!(walk.last().unwrap().target(), &a);
    assert_eq!(
        walk,
        vec![dep("g:a:1", "g:b:1"), dep("g:b:1", "g:c:1"), candidate.clone()]
    );
    assert!(cycle.walk_from(&gav("g:z:1")).is_none());
}

#[test]
fn test_no_cycle_for_forward_edge() {
    let mut store = MemoryGraphStore::new();
    store.insert_relationship(&dep("g:a:1", "g:b:1")).unwrap();
    let view = RelationshipView::global();
    let detector = CycleDetector::new(&store, &view);
    assert!(!detector.introduces_cycle(&dep("g:a:1", "g:c:1")).unwrap());
    assert!(!detector.introduces_cycle(&dep("g:c:1", "g:a:1")).unwrap());
}

#[test]
fn test_cycle_display() {
    let cycle = Cycle::new(vec![dep("g:a:1", "g:b:1"), dep("g:b:1", "g:a:1")]).unwrap();
    let text = cycle.to_string();
    assert!(text == "g:a:1 -> g:b:1 -> g:a:1" || text == "g:b:1 -> g:a:1 -> g:b:1");
}
