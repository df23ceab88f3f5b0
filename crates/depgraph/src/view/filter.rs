//! Path-aware relationship filters.
//!
//! A filter answers two questions at every hop of a traversal: is this
//! relationship visible here ([`RelationshipFilter::accept`]), and what filter
//! applies below it ([`RelationshipFilter::child_filter`]). Returning `None`
//! from `child_filter` means "unchanged", which lets the engine keep the same
//! [`PathState`](crate::traversal::PathState) instance along the path.

use crate::model::{DependencyScope, ProjectRef, Relationship, RelationshipType};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a filter.
pub type FilterRef = Arc<dyn RelationshipFilter>;

/// A path-aware predicate over relationships.
pub trait RelationshipFilter: fmt::Debug + Send + Sync {
    /// Whether `relationship` is visible at this point of the path.
    fn accept(&self, relationship: &Relationship) -> bool;

    /// Filter to apply to relationships below `parent`, or `None` if unchanged.
    fn child_filter(&self, parent: &Relationship) -> Option<FilterRef> {
        let _ = parent;
        None
    }

    /// Content-derived description; equal content must give equal ids.
    fn long_id(&self) -> String;
}

/// Admits everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyFilter;

impl RelationshipFilter for AnyFilter {
    fn accept(&self, _relationship: &Relationship) -> bool {
        true
    }

    fn long_id(&self) -> String {
        "ANY".to_string()
    }
}

/// Admits nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneFilter;

impl RelationshipFilter for NoneFilter {
    fn accept(&self, _relationship: &Relationship) -> bool {
        false
    }

    fn long_id(&self) -> String {
        "NONE".to_string()
    }
}

/// Admits a fixed set of relationship types.
#[derive(Debug, Clone)]
pub struct RelationshipTypeFilter {
    types: BTreeSet<RelationshipType>,
    include_managed: bool,
    include_concrete: bool,
}

impl RelationshipTypeFilter {
    /// Admit concrete (non-managed) relationships of the given types.
    pub fn new(types: impl IntoIterator<Item = RelationshipType>) -> Self {
        Self {
            types: types.into_iter().collect(),
            include_managed: false,
            include_concrete: true,
        }
    }

    /// Builder: also admit managed relationships.
    pub fn include_managed(mut self, include: bool) -> Self {
        self.include_managed = include;
        self
    }

    /// Builder: admit concrete relationships (default true).
    pub fn include_concrete(mut self, include: bool) -> Self {
        self.include_concrete = include;
        self
    }
}

impl RelationshipFilter for RelationshipTypeFilter {
    fn accept(&self, relationship: &Relationship) -> bool {
        if !self.types.contains(&relationship.kind()) {
            return false;
        }
        if relationship.is_managed() {
            self.include_managed
        } else {
            self.include_concrete
        }
    }

    fn long_id(&self) -> String {
        let types: Vec<String> = self.types.iter().map(ToString::to_string).collect();
        format!(
            "TYPES[{}];managed={};concrete={}",
            types.join(","),
            self.include_managed,
            self.include_concrete
        )
    }
}

/// Admits `PARENT` and `BOM` relationships: the structure a POM inherits from.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructureFilter;

impl RelationshipFilter for StructureFilter {
    fn accept(&self, relationship: &Relationship) -> bool {
        matches!(
            relationship.kind(),
            RelationshipType::Parent | RelationshipType::Bom
        )
    }

    fn long_id(&self) -> String {
        "STRUCTURE".to_string()
    }
}

/// Maven-style dependency resolution filter.
///
/// Scopes restrict which dependency edges are visible (empty = all scopes).
/// Optional dependencies are only admitted at the first hop. Exclusions
/// declared on a dependency apply to everything below it.
#[derive(Debug, Clone, Default)]
pub struct DependencyFilter {
    scopes: BTreeSet<DependencyScope>,
    include_optional: bool,
    include_managed: bool,
    exclusions: BTreeSet<ProjectRef>,
}

impl DependencyFilter {
    /// Admit dependencies in any scope, optional ones included at the first hop.
    pub fn new() -> Self {
        Self {
            include_optional: true,
            ..Self::default()
        }
    }

    /// Builder: restrict to the given scopes.
    pub fn scopes(mut self, scopes: impl IntoIterator<Item = DependencyScope>) -> Self {
        self.scopes = scopes.into_iter().collect();
        self
    }

    /// Builder: admit optional dependencies at the first hop.
    pub fn include_optional(mut self, include: bool) -> Self {
        self.include_optional = include;
        self
    }

    /// Builder: admit managed dependencies.
    pub fn include_managed(mut self, include: bool) -> Self {
        self.include_managed = include;
        self
    }

    /// Builder: exclude a project everywhere.
    pub fn exclude(mut self, project: ProjectRef) -> Self {
        self.exclusions.insert(project);
        self
    }
}

impl RelationshipFilter for DependencyFilter {
    fn accept(&self, relationship: &Relationship) -> bool {
        if relationship.kind() != RelationshipType::Dependency {
            return false;
        }
        if relationship.is_managed() && !self.include_managed {
            return false;
        }
        if self.exclusions.contains(&relationship.target().project_ref()) {
            return false;
        }
        match relationship.artifact() {
            Some(info) => {
                (self.scopes.is_empty() || self.scopes.contains(&info.scope))
                    && (!info.optional || self.include_optional)
            }
            None => true,
        }
    }

    fn child_filter(&self, parent: &Relationship) -> Option<FilterRef> {
        let new_exclusions: Vec<&ProjectRef> = parent
            .artifact()
            .map(|info| {
                info.exclusions
                    .iter()
                    .filter(|ex| !self.exclusions.contains(*ex))
                    .collect()
            })
            .unwrap_or_default();

        if !self.include_optional && new_exclusions.is_empty() {
            return None;
        }

        let mut child = self.clone();
        child.include_optional = false;
        child.exclusions.extend(new_exclusions.into_iter().cloned());
        Some(Arc::new(child))
    }

    fn long_id(&self) -> String {
        let scopes: Vec<String> = self.scopes.iter().map(ToString::to_string).collect();
        let exclusions: Vec<String> = self.exclusions.iter().map(ToString::to_string).collect();
        format!(
            "DEPS[{}];optional={};managed={};excludes[{}]",
            scopes.join(","),
            self.include_optional,
            self.include_managed,
            exclusions.join(",")
        )
    }
}

/// Admits what `inner` admits, but only for the first hop.
#[derive(Debug, Clone)]
pub struct DirectOnlyFilter {
    inner: FilterRef,
}

impl DirectOnlyFilter {
    /// Wrap `inner`.
    pub fn new(inner: FilterRef) -> Self {
        Self { inner }
    }
}

impl RelationshipFilter for DirectOnlyFilter {
    fn accept(&self, relationship: &Relationship) -> bool {
        self.inner.accept(relationship)
    }

    fn child_filter(&self, _parent: &Relationship) -> Option<FilterRef> {
        Some(Arc::new(NoneFilter))
    }

    fn long_id(&self) -> String {
        format!("DIRECT({})", self.inner.long_id())
    }
}

/// Admits a relationship only if every member filter does.
#[derive(Debug, Clone)]
pub struct AndFilter {
    filters: Vec<FilterRef>,
}

impl AndFilter {
    /// Combine `filters`.
    pub fn new(filters: Vec<FilterRef>) -> Self {
        Self { filters }
    }
}

impl RelationshipFilter for AndFilter {
    fn accept(&self, relationship: &Relationship) -> bool {
        self.filters.iter().all(|f| f.accept(relationship))
    }

    fn child_filter(&self, parent: &Relationship) -> Option<FilterRef> {
        child_filters(&self.filters, parent).map(|filters| Arc::new(AndFilter { filters }) as FilterRef)
    }

    fn long_id(&self) -> String {
        composite_id("AND", &self.filters)
    }
}

/// Admits a relationship if any member filter does.
#[derive(Debug, Clone)]
pub struct OrFilter {
    filters: Vec<FilterRef>,
}

impl OrFilter {
    /// Combine `filters`.
    pub fn new(filters: Vec<FilterRef>) -> Self {
        Self { filters }
    }
}

impl RelationshipFilter for OrFilter {
    fn accept(&self, relationship: &Relationship) -> bool {
        self.filters.iter().any(|f| f.accept(relationship))
    }

    fn child_filter(&self, parent: &Relationship) -> Option<FilterRef> {
        child_filters(&self.filters, parent).map(|filters| Arc::new(OrFilter { filters }) as FilterRef)
    }

    fn long_id(&self) -> String {
        composite_id("OR", &self.filters)
    }
}

/// Children of every member, or `None` when no member changed.
fn child_filters(filters: &[FilterRef], parent: &Relationship) -> Option<Vec<FilterRef>> {
    let children: Vec<Option<FilterRef>> = filters.iter().map(|f| f.child_filter(parent)).collect();
    if children.iter().all(Option::is_none) {
        return None;
    }
    Some(
        children
            .into_iter()
            .zip(filters)
            .map(|(child, original)| child.unwrap_or_else(|| Arc::clone(original)))
            .collect(),
    )
}

fn composite_id(name: &str, filters: &[FilterRef]) -> String {
    let ids: Vec<String> = filters.iter().map(|f| f.long_id()).collect();
    format!("{name}({})", ids.join(","))
}
