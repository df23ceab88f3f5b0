use depgraph::{RelationshipGraph, RelationshipType, RelationshipView};
use std::collections::BTreeMap;
use std::env;

fn main() {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "./example.graph".to_string());
    let graph = RelationshipGraph::open(&path).expect("Failed to open graph");

    let global = RelationshipView::global();
    let relationships = graph
        .all_relationships(&global)
        .expect("Failed to read relationships");
    let projects = graph.all_projects(&global).expect("Failed to read projects");
    println!("Project count: {}", projects.len());
    println!("Relationship count: {}", relationships.len());

    println!("\n--- Relationships by type ---");
    let mut by_type: BTreeMap<RelationshipType, usize> = BTreeMap::new();
    for rel in &relationships {
        *by_type.entry(rel.kind()).or_default() += 1;
    }
    for (kind, count) in &by_type {
        println!("  {kind}: {count}");
    }

    println!("\n--- Managed relationships ---");
    for rel in relationships.iter().filter(|rel| rel.is_managed()).take(20) {
        println!("  {rel}");
    }

    println!("\n--- Variable projects ---");
    for project in graph
        .variable_projects(&global)
        .expect("Failed to read projects")
    {
        println!("  {project}");
    }

    // Projects with nothing declared were never resolved
    let missing = graph
        .missing_projects(&global)
        .expect("Failed to read projects");
    println!("\n--- Missing projects ({}) ---", missing.len());
    for project in missing.iter().take(20) {
        println!("  {project}");
    }

    let root = env::args().nth(2);
    if let Some(root) = root {
        let root = depgraph::ProjectVersionRef::parse(&root).expect("Invalid root coordinate");
        let view = RelationshipView::rooted([root.clone()]);
        let reachable = graph.all_projects(&view).expect("Failed to read projects");
        println!("\n--- Reachable from {root}: {} projects ---", reachable.len());
        for cycle in graph.cycles_in(&view).expect("Failed to read cycles") {
            println!("  cycle: {cycle}");
        }
    }
}
