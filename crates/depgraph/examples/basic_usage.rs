//! Basic usage example for depgraph
//!
//! This example demonstrates:
//! - Creating a graph
//! - Adding relationships
//! - Querying a view and its paths

use depgraph::traversal::CollectingVisitor;
use depgraph::view::{DependencyFilter, ManagedDependencyMutator};
use depgraph::{
    ArtifactInfo, DependencyScope, ProjectVersionRef, Relationship, RelationshipGraph,
    RelationshipView, TraversalType,
};

fn gav(coordinate: &str) -> depgraph::Result<ProjectVersionRef> {
    ProjectVersionRef::parse(coordinate)
}

fn main() -> depgraph::Result<()> {
    // In-memory graph (use RelationshipGraph::open for a persistent one)
    let graph = RelationshipGraph::in_memory();

    println!("Building a small project graph...\n");

    let app = gav("org.acme:app:1.0")?;
    let parent = gav("org.acme:parent:3")?;
    let web = gav("org.acme:web:2.1")?;
    let json = gav("com.fasterxml:json:2.15")?;
    let junit = gav("org.junit:junit:5.10")?;

    let rejected = graph.add_relationships([
        Relationship::parent(app.clone(), parent.clone()).build(),
        Relationship::terminus(parent.clone()).build(),
        Relationship::dependency(app.clone(), web.clone()).index(0).build(),
        Relationship::dependency(app.clone(), junit.clone())
            .index(1)
            .artifact(ArtifactInfo::default().with_scope(DependencyScope::Test))
            .build(),
        Relationship::dependency(web.clone(), gav("com.fasterxml:json:2.9")?).build(),
        Relationship::dependency(app.clone(), json.clone())
            .managed(true)
            .build(),
    ])?;
    println!("✓ Added relationships ({} rejected)", rejected.len());

    // Every relationship reachable from the application
    let everything = RelationshipView::rooted([app.clone()]);
    println!("\nAll relationships from {app}:");
    for rel in graph.all_relationships(&everything)? {
        println!("  {rel}");
    }

    // Compile-scope dependencies with managed versions applied
    let compile = RelationshipView::builder()
        .root(app.clone())
        .filter(DependencyFilter::new().scopes([DependencyScope::Compile]))
        .mutator(ManagedDependencyMutator)
        .build();

    println!("\nDepth-first walk of {compile}:");
    let mut visitor = CollectingVisitor::default();
    graph.traverse(&compile, &app, &mut visitor, TraversalType::DepthFirst)?;
    for (rel, path) in visitor.relationships.iter().zip(&visitor.paths) {
        println!("  {rel}  (depth {})", path.len());
    }

    if let Some(paths) = graph.all_paths_to(&compile, &[json.clone()])? {
        println!("\nPaths to {json}:");
        for path in paths {
            println!("  {path}");
        }
    }

    // A relationship closing a loop is rejected
    let closing = Relationship::dependency(web.clone(), app.clone()).build();
    println!("\nIntroduces cycle: {}", graph.introduces_cycle(&closing)?);
    graph.add_relationships([closing])?;
    for cycle in graph.cycles_in(&everything)? {
        println!("✓ Recorded cycle: {cycle}");
    }

    println!("\nDOT export:\n{}", graph.export_dot(&compile)?);
    Ok(())
}
