//! Path-aware relationship mutators.
//!
//! A mutator may replace an accepted relationship with a different logical
//! edge before traversal continues, typically to pin a version. Like filters,
//! mutators derive a child for the next hop and return `None` when unchanged.

use crate::error::Result;
use crate::model::{ProjectRef, ProjectVersionRef, Relationship, RelationshipType};
use crate::storage::GraphStore;
use crate::traversal::{ordering, GraphPath};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a mutator.
pub type MutatorRef = Arc<dyn RelationshipMutator>;

/// Read access available to mutators while a traversal runs.
#[derive(Clone, Copy)]
pub struct MutationContext<'a> {
    store: &'a dyn GraphStore,
}

impl<'a> MutationContext<'a> {
    /// Context over `store`.
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self { store }
    }

    /// The store being traversed.
    pub fn store(&self) -> &'a dyn GraphStore {
        self.store
    }
}

/// Rewrites relationships as they are selected during a traversal.
pub trait RelationshipMutator: fmt::Debug + Send + Sync {
    /// The relationship to use in place of `relationship`, reached via `path`.
    ///
    /// # Errors
    ///
    /// Store failures while looking up context propagate.
    fn select(
        &self,
        relationship: &Relationship,
        path: &GraphPath,
        context: &MutationContext<'_>,
    ) -> Result<Relationship>;

    /// Mutator to apply below `parent`, or `None` if unchanged.
    fn child_mutator(&self, parent: &Relationship) -> Option<MutatorRef> {
        let _ = parent;
        None
    }

    /// Content-derived description; equal content must give equal ids.
    fn long_id(&self) -> String;
}

/// Leaves every relationship untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMutator;

impl RelationshipMutator for NoOpMutator {
    fn select(
        &self,
        relationship: &Relationship,
        _path: &GraphPath,
        _context: &MutationContext<'_>,
    ) -> Result<Relationship> {
        Ok(relationship.clone())
    }

    fn long_id(&self) -> String {
        "NOOP".to_string()
    }
}

/// Pins `group:artifact` targets to selected versions.
#[derive(Debug, Clone, Default)]
pub struct VersionSelectionMutator {
    selections: BTreeMap<ProjectRef, ProjectVersionRef>,
}

impl VersionSelectionMutator {
    /// Mutator applying `selections`.
    pub fn new(selections: BTreeMap<ProjectRef, ProjectVersionRef>) -> Self {
        Self { selections }
    }

    /// The pinned versions.
    pub fn selections(&self) -> &BTreeMap<ProjectRef, ProjectVersionRef> {
        &self.selections
    }
}

impl RelationshipMutator for VersionSelectionMutator {
    fn select(
        &self,
        relationship: &Relationship,
        _path: &GraphPath,
        _context: &MutationContext<'_>,
    ) -> Result<Relationship> {
        let target = relationship.target();
        match self.selections.get(&target.project_ref()) {
            Some(selected) if selected != target => Ok(relationship.select_target(selected.clone())),
            _ => Ok(relationship.clone()),
        }
    }

    fn long_id(&self) -> String {
        let pins: Vec<String> = self
            .selections
            .iter()
            .map(|(project, version)| format!("{project}={}", version.version()))
            .collect();
        format!("SELECT[{}]", pins.join(","))
    }
}

/// Applies managed dependency versions declared along the path.
///
/// For a concrete `DEPENDENCY` edge, the nodes of the path are searched from
/// the root down to the declaring project. The first managed dependency on
/// the same `group:artifact` wins, so management closer to the root
/// overrides management further down.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManagedDependencyMutator;

impl ManagedDependencyMutator {
    fn managed_version(
        node: &ProjectVersionRef,
        project: &ProjectRef,
        context: &MutationContext<'_>,
    ) -> Result<Option<ProjectVersionRef>> {
        let mut managed: Vec<Relationship> = context
            .store()
            .outgoing(node)?
            .into_iter()
            .filter(|rel| rel.kind() == RelationshipType::Dependency && rel.is_managed())
            .collect();
        ordering::sort_relationships(&mut managed);

        Ok(managed
            .into_iter()
            .find(|rel| rel.target().same_project(project))
            .map(|rel| rel.target().clone()))
    }
}

impl RelationshipMutator for ManagedDependencyMutator {
    fn select(
        &self,
        relationship: &Relationship,
        path: &GraphPath,
        context: &MutationContext<'_>,
    ) -> Result<Relationship> {
        if relationship.kind() != RelationshipType::Dependency || relationship.is_managed() {
            return Ok(relationship.clone());
        }

        let project = relationship.target().project_ref();
        let nodes = if path.is_empty() {
            vec![relationship.declaring().clone()]
        } else {
            path.projects()
        };

        for node in &nodes {
            if let Some(version) = Self::managed_version(node, &project, context)? {
                if &version != relationship.target() {
                    return Ok(relationship.select_target(version));
                }
                break;
            }
        }
        Ok(relationship.clone())
    }

    fn long_id(&self) -> String {
        "MANAGED".to_string()
    }
}

/// Applies several mutators in sequence.
#[derive(Debug, Clone)]
pub struct ChainMutator {
    mutators: Vec<MutatorRef>,
}

impl ChainMutator {
    /// Chain `mutators`; earlier mutators run first.
    pub fn new(mutators: Vec<MutatorRef>) -> Self {
        Self { mutators }
    }
}

impl RelationshipMutator for ChainMutator {
    fn select(
        &self,
        relationship: &Relationship,
        path: &GraphPath,
        context: &MutationContext<'_>,
    ) -> Result<Relationship> {
        let mut selected = relationship.clone();
        for mutator in &self.mutators {
            selected = mutator.select(&selected, path, context)?;
        }
        Ok(selected)
    }

    fn child_mutator(&self, parent: &Relationship) -> Option<MutatorRef> {
        let children: Vec<Option<MutatorRef>> =
            self.mutators.iter().map(|m| m.child_mutator(parent)).collect();
        if children.iter().all(Option::is_none) {
            return None;
        }
        let mutators = children
            .into_iter()
            .zip(&self.mutators)
            .map(|(child, original)| child.unwrap_or_else(|| Arc::clone(original)))
            .collect();
        Some(Arc::new(ChainMutator { mutators }))
    }

    fn long_id(&self) -> String {
        let ids: Vec<String> = self.mutators.iter().map(|m| m.long_id()).collect();
        format!("CHAIN({})", ids.join(","))
    }
}
