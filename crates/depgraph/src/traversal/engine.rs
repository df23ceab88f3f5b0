//! Depth-first and breadth-first traversal over a view.

use super::{ordering, GraphPath, PathState};
use crate::error::Result;
use crate::model::{ProjectVersionRef, Relationship};
use crate::storage::GraphStore;
use crate::view::{MutationContext, RelationshipView};
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Traversal order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalType {
    /// Explore each branch fully before the next; edges are reported after
    /// their subtree.
    #[default]
    DepthFirst,
    /// Explore level by level; edges are reported as they are reached.
    BreadthFirst,
}

/// Callbacks invoked by [`TraversalEngine`].
pub trait RelationshipVisitor {
    /// Called for each selected relationship before it is followed.
    ///
    /// `path` already ends with `relationship`. Returning `false` prunes it:
    /// the edge is neither descended into nor reported.
    fn pre_check(&mut self, relationship: &Relationship, path: &GraphPath) -> bool {
        let _ = (relationship, path);
        true
    }

    /// Called once a selected relationship has been traversed.
    ///
    /// `state` is the state in effect below `relationship`.
    fn edge_traversed(&mut self, relationship: &Relationship, path: &GraphPath, state: &PathState);
}

/// A point to resume traversal from.
#[derive(Debug, Clone)]
pub struct TraversalStart {
    /// Project whose out-edges are explored.
    pub node: ProjectVersionRef,
    /// Path that led to `node`; empty at a root.
    pub path: GraphPath,
    /// State in effect at `node`.
    pub state: PathState,
}

impl TraversalStart {
    /// Start at a view root.
    pub fn root(node: ProjectVersionRef, view: &RelationshipView) -> Self {
        Self {
            node,
            path: GraphPath::empty(),
            state: view.root_state().clone(),
        }
    }
}

struct Step {
    relationship: Relationship,
    path: GraphPath,
    state: PathState,
    descend: bool,
}

struct Frame {
    path: GraphPath,
    state: PathState,
    edges: Vec<Relationship>,
    next: usize,
    arrival: Option<Relationship>,
}

/// Walks the relationships visible in a view.
///
/// At every hop, the edge must pass the view's provenance check and the
/// current [`PathState`]; the selected (possibly mutated) relationship is
/// what the visitor sees and what the traversal follows. Descent stops at
/// terminal parents, variable targets, and targets already on the path.
pub struct TraversalEngine<'a> {
    store: &'a dyn GraphStore,
    view: &'a RelationshipView,
}

impl<'a> TraversalEngine<'a> {
    /// Engine over `store` as seen through `view`.
    pub fn new(store: &'a dyn GraphStore, view: &'a RelationshipView) -> Self {
        Self { store, view }
    }

    /// Traverse from every root of the view.
    ///
    /// # Errors
    ///
    /// Store and mutator failures abort the traversal.
    pub fn traverse(
        &self,
        visitor: &mut dyn RelationshipVisitor,
        mode: TraversalType,
    ) -> Result<()> {
        let starts = self
            .view
            .roots()
            .iter()
            .map(|root| TraversalStart::root(root.clone(), self.view))
            .collect();
        self.traverse_from(starts, visitor, mode)
    }

    /// Traverse from arbitrary resume points, following all their out-edges.
    ///
    /// # Errors
    ///
    /// Store and mutator failures abort the traversal.
    pub fn traverse_from(
        &self,
        starts: Vec<TraversalStart>,
        visitor: &mut dyn RelationshipVisitor,
        mode: TraversalType,
    ) -> Result<()> {
        let mut seeds = Vec::with_capacity(starts.len());
        for start in starts {
            let edges = self.sorted_out_edges(&start.node)?;
            seeds.push((start, edges));
        }
        self.run(seeds, visitor, mode)
    }

    /// Traverse `edges` from `start`, then everything below them.
    ///
    /// # Errors
    ///
    /// Store and mutator failures abort the traversal.
    pub fn traverse_edges(
        &self,
        start: TraversalStart,
        edges: Vec<Relationship>,
        visitor: &mut dyn RelationshipVisitor,
        mode: TraversalType,
    ) -> Result<()> {
        self.run(vec![(start, edges)], visitor, mode)
    }

    /// Out-edges of `node` in traversal order. Provenance is checked later,
    /// per hop.
    pub fn sorted_out_edges(&self, node: &ProjectVersionRef) -> Result<Vec<Relationship>> {
        let mut edges = self.store.outgoing(node)?;
        ordering::sort_relationships(&mut edges);
        Ok(edges)
    }

    fn run(
        &self,
        seeds: Vec<(TraversalStart, Vec<Relationship>)>,
        visitor: &mut dyn RelationshipVisitor,
        mode: TraversalType,
    ) -> Result<()> {
        match mode {
            TraversalType::DepthFirst => self.depth_first(seeds, visitor),
            TraversalType::BreadthFirst => self.breadth_first(seeds, visitor),
        }
    }

    fn depth_first(
        &self,
        seeds: Vec<(TraversalStart, Vec<Relationship>)>,
        visitor: &mut dyn RelationshipVisitor,
    ) -> Result<()> {
        let mut seen: HashSet<(ProjectVersionRef, GraphPath, PathState)> = HashSet::new();

        for (start, edges) in seeds {
            if !seen.insert((start.node.clone(), start.path.clone(), start.state.clone())) {
                continue;
            }
            let mut stack = vec![Frame {
                path: start.path,
                state: start.state,
                edges,
                next: 0,
                arrival: None,
            }];

            while let Some(frame) = stack.last_mut() {
                if frame.next == frame.edges.len() {
                    if let Some(done) = stack.pop() {
                        if let Some(rel) = done.arrival {
                            visitor.edge_traversed(&rel, &done.path, &done.state);
                        }
                    }
                    continue;
                }

                let edge = frame.edges[frame.next].clone();
                frame.next += 1;
                let path = frame.path.clone();
                let state = frame.state.clone();

                let Some(step) = self.advance(&edge, &path, &state, visitor)? else {
                    continue;
                };
                let key = (
                    step.relationship.target().clone(),
                    step.path.clone(),
                    step.state.clone(),
                );
                if step.descend && seen.insert(key) {
                    let edges = self.sorted_out_edges(step.relationship.target())?;
                    stack.push(Frame {
                        path: step.path,
                        state: step.state,
                        edges,
                        next: 0,
                        arrival: Some(step.relationship),
                    });
                } else {
                    visitor.edge_traversed(&step.relationship, &step.path, &step.state);
                }
            }
        }
        Ok(())
    }

    fn breadth_first(
        &self,
        seeds: Vec<(TraversalStart, Vec<Relationship>)>,
        visitor: &mut dyn RelationshipVisitor,
    ) -> Result<()> {
        let mut seen: HashSet<(ProjectVersionRef, GraphPath, PathState)> = HashSet::new();
        let mut layer = Vec::with_capacity(seeds.len());
        for (start, edges) in seeds {
            if seen.insert((start.node.clone(), start.path.clone(), start.state.clone())) {
                layer.push((start.path, start.state, edges));
            }
        }

        while !layer.is_empty() {
            let mut next_layer = Vec::new();
            for (path, state, edges) in layer {
                for edge in &edges {
                    let Some(step) = self.advance(edge, &path, &state, visitor)? else {
                        continue;
                    };
                    visitor.edge_traversed(&step.relationship, &step.path, &step.state);

                    let target = step.relationship.target().clone();
                    if step.descend
                        && seen.insert((target.clone(), step.path.clone(), step.state.clone()))
                    {
                        let edges = self.sorted_out_edges(&target)?;
                        next_layer.push((step.path, step.state, edges));
                    }
                }
            }
            layer = next_layer;
        }
        Ok(())
    }

    fn advance(
        &self,
        edge: &Relationship,
        path: &GraphPath,
        state: &PathState,
        visitor: &mut dyn RelationshipVisitor,
    ) -> Result<Option<Step>> {
        if !self.view.accepts_provenance(edge) {
            trace!("Provenance excludes {edge}");
            return Ok(None);
        }
        let context = MutationContext::new(self.store);
        let Some(selected) = state.select_relationship(edge, path, &context)? else {
            trace!("Filter rejects {edge}");
            return Ok(None);
        };

        let next_path = path.append(selected.clone());
        if !visitor.pre_check(&selected, &next_path) {
            return Ok(None);
        }

        let next_state = state.child_path_state(&selected);
        let descend = descends_after(&selected, path.relationships());

        Ok(Some(Step {
            relationship: selected,
            path: next_path,
            state: next_state,
            descend,
        }))
    }
}

/// Whether traversal continues below `relationship` when it follows `before`.
///
/// Terminal parents, self-references and variable targets are leaves, and a
/// target already on the path closes a loop.
fn descends_after(relationship: &Relationship, before: &[Relationship]) -> bool {
    let target = relationship.target();
    let on_path = before.first().is_some_and(|first| first.declaring() == target)
        || before.iter().any(|rel| rel.target() == target);
    !relationship.is_terminus()
        && !relationship.is_self_referential()
        && !on_path
        && !target.is_variable()
}

/// Whether a traversal that recorded `path` went on below its last
/// relationship. The empty path always does.
pub(crate) fn descends_past(path: &GraphPath) -> bool {
    match path.relationships().split_last() {
        Some((last, before)) => descends_after(last, before),
        None => true,
    }
}

/// Visitor collecting every traversed relationship in report order.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    /// Relationships in the order they were reported.
    pub relationships: Vec<Relationship>,
    /// The path that reached each relationship.
    pub paths: Vec<GraphPath>,
}

impl RelationshipVisitor for CollectingVisitor {
    fn edge_traversed(&mut self, relationship: &Relationship, path: &GraphPath, _state: &PathState) {
        self.relationships.push(relationship.clone());
        self.paths.push(path.clone());
    }
}
