//! Sharing one graph between threads.

use crate::common::{dep, gav};
use depgraph::{RelationshipGraph, RelationshipView};
use std::sync::Arc;
use std::thread;

#[test]
fn test_concurrent_writers_and_readers() {
    let graph = Arc::new(RelationshipGraph::in_memory());
    let view = RelationshipView::rooted([gav("g:root:1")]);

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let graph = Arc::clone(&graph);
            let view = view.clone();
            thread::spawn(move || {
                let head = format!("g:w{worker}:1");
                graph.add_relationships([dep("g:root:1", &head)]).unwrap();
                for step in 0..10 {
                    let from = format!("g:w{worker}:{}", step + 1);
                    let to = format!("g:w{worker}:{}", step + 2);
                    graph.add_relationships([dep(&from, &to)]).unwrap();
                    graph.all_projects(&view).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // root plus eleven projects per worker
    assert_eq!(graph.all_projects(&view).unwrap().len(), 1 + 4 * 11);
    for worker in 0..4 {
        let tail = gav(&format!("g:w{worker}:11"));
        let paths = graph.all_paths_to(&view, &[tail]).unwrap().unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths.iter().next().unwrap().len(), 11);
    }
}
