//! Cycle detection.
//!
//! A [`Cycle`] is a closed walk of relationships stored in a canonical
//! rotation (smallest relationship id first), so the same loop found from
//! different starting edges compares and hashes equal.

use crate::error::Result;
use crate::model::{ProjectVersionRef, Relationship};
use crate::storage::GraphStore;
use crate::traversal::{
    GraphPath, PathState, RelationshipVisitor, TraversalEngine, TraversalStart, TraversalType,
};
use crate::view::RelationshipView;
use log::trace;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A closed walk of relationships, canonically rotated.
#[derive(Debug, Clone)]
pub struct Cycle {
    relationships: Vec<Relationship>,
}

impl Cycle {
    /// Build a cycle, or `None` if `relationships` is empty or is not a
    /// contiguous closed walk.
    pub fn new(mut relationships: Vec<Relationship>) -> Option<Self> {
        let first = relationships.first()?;
        let last = relationships.last()?;
        if last.target() != first.declaring() {
            return None;
        }
        let contiguous = relationships
            .windows(2)
            .all(|pair| pair[0].target() == pair[1].declaring());
        if !contiguous {
            return None;
        }

        let start = relationships
            .iter()
            .enumerate()
            .min_by_key(|(_, rel)| rel.id())
            .map_or(0, |(i, _)| i);
        relationships.rotate_left(start);
        Some(Self { relationships })
    }

    /// Relationships in canonical order.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    /// Always false; cycles have at least one relationship.
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    /// Projects on the cycle, in walk order.
    pub fn projects(&self) -> Vec<&ProjectVersionRef> {
        self.relationships.iter().map(Relationship::declaring).collect()
    }

    /// Whether `project` is on the cycle.
    pub fn contains_project(&self, project: &ProjectVersionRef) -> bool {
        self.relationships.iter().any(|rel| rel.declaring() == project)
    }

    /// Whether `relationship` is part of the cycle.
    pub fn contains(&self, relationship: &Relationship) -> bool {
        self.relationships.contains(relationship)
    }

    /// The walk rotated to start and end at `project`, or `None` if the
    /// project is not on the cycle.
    pub fn walk_from(&self, project: &ProjectVersionRef) -> Option<Vec<Relationship>> {
        let start = self
            .relationships
            .iter()
            .position(|rel| rel.declaring() == project)?;
        let mut walk = self.relationships.clone();
        walk.rotate_left(start);
        Some(walk)
    }
}

impl PartialEq for Cycle {
    fn eq(&self, other: &Self) -> bool {
        self.relationships == other.relationships
    }
}

impl Eq for Cycle {}

impl Hash for Cycle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.relationships.hash(state);
    }
}

impl PartialOrd for Cycle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cycle {
    fn cmp(&self, other: &Self) -> Ordering {
        self.relationships
            .iter()
            .map(Relationship::id)
            .cmp(other.relationships.iter().map(Relationship::id))
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut projects: Vec<String> = self.projects().iter().map(ToString::to_string).collect();
        if let Some(first) = projects.first().cloned() {
            projects.push(first);
        }
        write!(f, "{}", projects.join(" -> "))
    }
}

/// Finds cycles a relationship closes within a view.
pub struct CycleDetector<'a> {
    store: &'a dyn GraphStore,
    view: &'a RelationshipView,
}

impl<'a> CycleDetector<'a> {
    /// Detector over `store` as seen through `view`.
    pub fn new(store: &'a dyn GraphStore, view: &'a RelationshipView) -> Self {
        Self { store, view }
    }

    /// Every cycle that `candidate` is part of, or would be if stored.
    ///
    /// Walks from the candidate's target; every path that arrives back at the
    /// candidate's declaring project closes a cycle. A self-referential
    /// candidate yields nothing.
    ///
    /// # Errors
    ///
    /// Store and mutator failures propagate.
    pub fn cycles_through(&self, candidate: &Relationship) -> Result<BTreeSet<Cycle>> {
        if candidate.is_self_referential() {
            return Ok(BTreeSet::new());
        }

        let mut visitor = CycleVisitor {
            candidate,
            cycles: BTreeSet::new(),
        };
        let start = TraversalStart {
            node: candidate.target().clone(),
            path: GraphPath::empty(),
            state: self.view.root_state().clone(),
        };
        TraversalEngine::new(self.store, self.view).traverse_from(
            vec![start],
            &mut visitor,
            TraversalType::DepthFirst,
        )?;

        trace!("{} cycle(s) through {candidate}", visitor.cycles.len());
        Ok(visitor.cycles)
    }

    /// Whether storing `candidate` would close a cycle.
    ///
    /// # Errors
    ///
    /// Store and mutator failures propagate.
    pub fn introduces_cycle(&self, candidate: &Relationship) -> Result<bool> {
        Ok(!self.cycles_through(candidate)?.is_empty())
    }

    /// Union of the cycles through each of `relationships`.
    ///
    /// # Errors
    ///
    /// Store and mutator failures propagate.
    pub fn cycles_among<'r>(
        &self,
        relationships: impl IntoIterator<Item = &'r Relationship>,
    ) -> Result<BTreeSet<Cycle>> {
        let mut cycles = BTreeSet::new();
        for rel in relationships {
            cycles.extend(self.cycles_through(rel)?);
        }
        Ok(cycles)
    }
}

struct CycleVisitor<'c> {
    candidate: &'c Relationship,
    cycles: BTreeSet<Cycle>,
}

impl RelationshipVisitor for CycleVisitor<'_> {
    fn pre_check(&mut self, relationship: &Relationship, path: &GraphPath) -> bool {
        if relationship.target() != self.candidate.declaring() {
            return true;
        }
        let mut walk = Vec::with_capacity(path.len() + 1);
        walk.push(self.candidate.clone());
        walk.extend(path.relationships().iter().cloned());
        if let Some(cycle) = Cycle::new(walk) {
            self.cycles.insert(cycle);
        }
        false
    }

    fn edge_traversed(&mut self, _relationship: &Relationship, _path: &GraphPath, _state: &PathState) {}
}
