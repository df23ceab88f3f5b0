//! View-scoped graph traversal.
//!
//! [`TraversalEngine`] walks the relationships visible through a
//! [`RelationshipView`](crate::view::RelationshipView), tracking the
//! [`GraphPath`] that reached each edge and the [`PathState`] in effect along
//! it. Visitors observe the walk through [`RelationshipVisitor`].

mod engine;
pub mod ordering;
mod path;
mod state;

pub use engine::{
    CollectingVisitor, RelationshipVisitor, TraversalEngine, TraversalStart, TraversalType,
};
pub(crate) use engine::descends_past;
pub use path::GraphPath;
pub use state::PathState;
