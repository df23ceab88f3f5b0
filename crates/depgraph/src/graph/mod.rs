//! The graph façade.
//!
//! [`RelationshipGraph`] ties the store, view caches and cycle detection
//! together behind one synchronized interface.

mod relationship_graph;

pub use relationship_graph::RelationshipGraph;
