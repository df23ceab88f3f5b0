//! Contiguous relationship paths.

use crate::model::{ProjectVersionRef, Relationship};
use std::fmt;
use std::sync::Arc;

/// An immutable, contiguous sequence of relationships.
///
/// Each relationship's target is the next one's declaring project. Paths are
/// cheap to clone; [`GraphPath::append`] copies the sequence once.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GraphPath {
    relationships: Arc<[Relationship]>,
}

impl GraphPath {
    /// The empty path.
    pub fn empty() -> Self {
        Self {
            relationships: Arc::from(Vec::new()),
        }
    }

    /// Build a path, or `None` if the relationships are not contiguous.
    pub fn new(relationships: Vec<Relationship>) -> Option<Self> {
        let contiguous = relationships
            .windows(2)
            .all(|pair| pair[0].target() == pair[1].declaring());
        contiguous.then(|| Self {
            relationships: Arc::from(relationships),
        })
    }

    /// This path followed by `relationship`, or `None` if it doesn't continue
    /// from the current end.
    pub fn extend(&self, relationship: Relationship) -> Option<Self> {
        match self.relationships.last() {
            Some(last) if last.target() != relationship.declaring() => None,
            _ => Some(self.append(relationship)),
        }
    }

    /// This path followed by `relationship`, without a contiguity check.
    pub(crate) fn append(&self, relationship: Relationship) -> Self {
        let mut relationships = Vec::with_capacity(self.relationships.len() + 1);
        relationships.extend(self.relationships.iter().cloned());
        relationships.push(relationship);
        Self {
            relationships: Arc::from(relationships),
        }
    }

    /// Relationships in order.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    /// Whether the path has no relationships.
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    /// The first relationship's declaring project.
    pub fn source_project(&self) -> Option<&ProjectVersionRef> {
        self.relationships.first().map(Relationship::declaring)
    }

    /// The last relationship's target project.
    pub fn target_project(&self) -> Option<&ProjectVersionRef> {
        self.relationships.last().map(Relationship::target)
    }

    /// Projects along the path: the source, then each target.
    pub fn projects(&self) -> Vec<ProjectVersionRef> {
        let mut projects = Vec::with_capacity(self.relationships.len() + 1);
        if let Some(source) = self.source_project() {
            projects.push(source.clone());
        }
        projects.extend(self.relationships.iter().map(|rel| rel.target().clone()));
        projects
    }

    /// Whether `project` appears anywhere on the path.
    pub fn contains_project(&self, project: &ProjectVersionRef) -> bool {
        self.source_project() == Some(project)
            || self.relationships.iter().any(|rel| rel.target() == project)
    }
}

impl Default for GraphPath {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for GraphPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GraphPath({self})")
    }
}

impl fmt::Display for GraphPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let projects: Vec<String> = self.projects().iter().map(ToString::to_string).collect();
        write!(f, "{}", projects.join(" -> "))
    }
}
