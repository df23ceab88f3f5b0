//! Unit tests for DOT and JSON export of views.

use crate::common::{dep, gav};
use depgraph::export::{export_dot_styled, DotOptions};
use depgraph::{Relationship, RelationshipGraph, RelationshipView};
use serde_json::Value;

fn sample_graph() -> RelationshipGraph {
    let graph = RelationshipGraph::in_memory();
    graph
        .add_relationships([
            dep("g:app:1", "g:lib:1"),
            dep("g:lib:1", "g:util:1"),
            Relationship::plugin(gav("g:app:1"), gav("g:compiler:3")).build(),
        ])
        .unwrap();
    graph
}

#[test]
fn test_export_dot_for_view() {
    let graph = sample_graph();
    let view = RelationshipView::rooted([gav("g:app:1")]);
    let dot = graph.export_dot(&view).unwrap();

    assert!(dot.starts_with("digraph relationship_graph {"));
    assert!(dot.trim_end().ends_with('}'));
    assert!(dot.contains("label=\"g:app:1\""));
    assert_eq!(dot.matches(" -> ").count(), 3);
}

#[test]
fn test_export_dot_styled_rankdir() {
    let options = DotOptions {
        rankdir: "TB".to_string(),
        ..Default::default()
    };
    let dot = export_dot_styled(&[dep("g:a:1", "g:b:1")], &Default::default(), &options);
    assert!(dot.contains("rankdir=TB;"));
}

#[test]
fn test_export_json_for_view() {
    let graph = sample_graph();
    let view = RelationshipView::rooted([gav("g:lib:1")]);
    let json = graph.export_json(&view).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(value["links"].as_array().unwrap().len(), 1);
    assert_eq!(value["links"][0]["source"], "g:lib:1");
    assert_eq!(value["links"][0]["scope"], "compile");
}
