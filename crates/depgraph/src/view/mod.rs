//! Views: rooted, filtered, mutated perspectives on the graph.
//!
//! A [`RelationshipView`] bundles everything that decides which relationships a
//! query sees:
//!
//! - roots the traversal starts from (none = the whole store)
//! - an optional path-aware [`RelationshipFilter`]
//! - an optional [`RelationshipMutator`]
//! - provenance restrictions on sources and POM locations
//! - version selections pinning `group:artifact` to a version
//!
//! Two views with the same content have the same [`RelationshipView::id`], so
//! they share membership caches.

pub mod filter;
pub mod mutator;

pub use filter::{
    AndFilter, AnyFilter, DependencyFilter, DirectOnlyFilter, FilterRef, NoneFilter, OrFilter,
    RelationshipFilter, RelationshipTypeFilter, StructureFilter,
};
pub use mutator::{
    ChainMutator, ManagedDependencyMutator, MutationContext, MutatorRef, NoOpMutator,
    RelationshipMutator, VersionSelectionMutator,
};

use crate::model::{ProjectRef, ProjectVersionRef, Relationship, ANY_SOURCE};
use crate::traversal::PathState;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A rooted, filtered, mutated perspective on the graph.
#[derive(Clone)]
pub struct RelationshipView {
    roots: BTreeSet<ProjectVersionRef>,
    filter: Option<FilterRef>,
    mutator: Option<MutatorRef>,
    active_sources: BTreeSet<String>,
    active_pom_locations: BTreeSet<String>,
    selections: BTreeMap<ProjectRef, ProjectVersionRef>,
    long_id: String,
    id: String,
    root_state: PathState,
}

impl RelationshipView {
    /// Start building a view.
    pub fn builder() -> RelationshipViewBuilder {
        RelationshipViewBuilder::default()
    }

    /// Rootless, unfiltered view over the whole store.
    pub fn global() -> Self {
        Self::builder().build()
    }

    /// Unfiltered view rooted at `roots`.
    pub fn rooted(roots: impl IntoIterator<Item = ProjectVersionRef>) -> Self {
        Self::builder().roots(roots).build()
    }

    /// Traversal roots.
    pub fn roots(&self) -> &BTreeSet<ProjectVersionRef> {
        &self.roots
    }

    /// Whether the view has at least one root.
    pub fn has_roots(&self) -> bool {
        !self.roots.is_empty()
    }

    /// The root filter, if any.
    pub fn filter(&self) -> Option<&FilterRef> {
        self.filter.as_ref()
    }

    /// The user-supplied mutator, if any.
    pub fn mutator(&self) -> Option<&MutatorRef> {
        self.mutator.as_ref()
    }

    /// Sources a relationship must come from; empty means any.
    pub fn active_sources(&self) -> &BTreeSet<String> {
        &self.active_sources
    }

    /// POM locations a relationship must be declared in; empty means any.
    pub fn active_pom_locations(&self) -> &BTreeSet<String> {
        &self.active_pom_locations
    }

    /// Version selections.
    pub fn selections(&self) -> &BTreeMap<ProjectRef, ProjectVersionRef> {
        &self.selections
    }

    /// Selected version for a `group:artifact`, if pinned.
    pub fn selection_for(&self, project: &ProjectRef) -> Option<&ProjectVersionRef> {
        self.selections.get(project)
    }

    /// Short stable identity, derived from [`RelationshipView::long_id`].
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Full content description.
    pub fn long_id(&self) -> &str {
        &self.long_id
    }

    /// The path state every traversal of this view starts in.
    pub fn root_state(&self) -> &PathState {
        &self.root_state
    }

    /// Whether the relationship's provenance is visible in this view.
    ///
    /// Sources restrict when non-empty and not containing [`ANY_SOURCE`]; a
    /// relationship matches if any of its sources is active. POM locations
    /// restrict when non-empty.
    pub fn accepts_provenance(&self, relationship: &Relationship) -> bool {
        let source_ok = self.active_sources.is_empty()
            || self.active_sources.contains(ANY_SOURCE)
            || relationship
                .sources()
                .iter()
                .any(|source| self.active_sources.contains(source));
        let location_ok = self.active_pom_locations.is_empty()
            || self.active_pom_locations.contains(relationship.pom_location());
        source_ok && location_ok
    }

    /// Whether the relationship passes provenance and the root filter.
    pub fn accepts(&self, relationship: &Relationship) -> bool {
        self.accepts_provenance(relationship)
            && self.filter.as_ref().map_or(true, |f| f.accept(relationship))
    }
}

impl PartialEq for RelationshipView {
    fn eq(&self, other: &Self) -> bool {
        self.long_id == other.long_id
    }
}

impl Eq for RelationshipView {}

impl fmt::Debug for RelationshipView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationshipView")
            .field("id", &self.id)
            .field("long_id", &self.long_id)
            .finish()
    }
}

impl fmt::Display for RelationshipView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view {}", self.id)
    }
}

/// Builder for [`RelationshipView`].
#[derive(Debug, Default)]
pub struct RelationshipViewBuilder {
    roots: BTreeSet<ProjectVersionRef>,
    filter: Option<FilterRef>,
    mutator: Option<MutatorRef>,
    active_sources: BTreeSet<String>,
    active_pom_locations: BTreeSet<String>,
    selections: BTreeMap<ProjectRef, ProjectVersionRef>,
}

impl RelationshipViewBuilder {
    /// Add a root.
    pub fn root(mut self, root: ProjectVersionRef) -> Self {
        self.roots.insert(root);
        self
    }

    /// Add several roots.
    pub fn roots(mut self, roots: impl IntoIterator<Item = ProjectVersionRef>) -> Self {
        self.roots.extend(roots);
        self
    }

    /// Set the root filter.
    pub fn filter(mut self, filter: impl RelationshipFilter + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Set the root filter from a shared handle.
    pub fn filter_ref(mut self, filter: FilterRef) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the mutator.
    pub fn mutator(mut self, mutator: impl RelationshipMutator + 'static) -> Self {
        self.mutator = Some(Arc::new(mutator));
        self
    }

    /// Set the mutator from a shared handle.
    pub fn mutator_ref(mut self, mutator: MutatorRef) -> Self {
        self.mutator = Some(mutator);
        self
    }

    /// Restrict to relationships from `source`.
    pub fn active_source(mut self, source: impl Into<String>) -> Self {
        self.active_sources.insert(source.into());
        self
    }

    /// Restrict to relationships declared at `location`.
    pub fn active_pom_location(mut self, location: impl Into<String>) -> Self {
        self.active_pom_locations.insert(location.into());
        self
    }

    /// Pin a `group:artifact` to `version`.
    pub fn select(mut self, version: ProjectVersionRef) -> Self {
        self.selections.insert(version.project_ref(), version);
        self
    }

    /// Finish the view.
    pub fn build(self) -> RelationshipView {
        let long_id = self.long_id();
        let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, long_id.as_bytes())
            .simple()
            .to_string();

        let effective_mutator = match (&self.mutator, self.selections.is_empty()) {
            (None, true) => None,
            (Some(user), true) => Some(Arc::clone(user)),
            (None, false) => Some(Arc::new(VersionSelectionMutator::new(self.selections.clone()))
                as MutatorRef),
            (Some(user), false) => Some(Arc::new(ChainMutator::new(vec![
                Arc::new(VersionSelectionMutator::new(self.selections.clone())),
                Arc::clone(user),
            ])) as MutatorRef),
        };
        let root_state = PathState::new(self.filter.clone(), effective_mutator);

        RelationshipView {
            roots: self.roots,
            filter: self.filter,
            mutator: self.mutator,
            active_sources: self.active_sources,
            active_pom_locations: self.active_pom_locations,
            selections: self.selections,
            long_id,
            id,
            root_state,
        }
    }

    fn long_id(&self) -> String {
        let roots: Vec<String> = self.roots.iter().map(ToString::to_string).collect();
        let sources: Vec<&str> = self.active_sources.iter().map(String::as_str).collect();
        let locations: Vec<&str> = self.active_pom_locations.iter().map(String::as_str).collect();
        let selections: Vec<String> = self.selections.values().map(ToString::to_string).collect();
        format!(
            "roots[{}];filter:{};mutator:{};sources[{}];locations[{}];selections[{}]",
            roots.join(","),
            self.filter.as_ref().map_or_else(|| "none".to_string(), |f| f.long_id()),
            self.mutator.as_ref().map_or_else(|| "none".to_string(), |m| m.long_id()),
            sources.join(","),
            locations.join(","),
            selections.join(",")
        )
    }
}
