//! Typed, provenance-tagged relationships between projects.

use super::project::{ProjectRef, ProjectVersionRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// POM location of relationships declared directly in a project's own POM.
pub const POM_ROOT_LOCATION: &str = "pom:root";

/// Source sentinel meaning "any source"; disables provenance restriction.
pub const ANY_SOURCE: &str = "any:any";

/// Closed set of relationship types. Declaration order is the ordering used
/// when sorting a node's out-edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    /// Project inherits from a parent POM
    Parent,
    /// Project imports a bill of materials
    Bom,
    /// Project depends on an artifact
    Dependency,
    /// Project uses a build plugin
    Plugin,
    /// A build plugin depends on an artifact
    PluginDependency,
    /// Project uses a build extension
    Extension,
}

impl RelationshipType {
    /// All types in ordinal order.
    pub const ALL: [RelationshipType; 6] = [
        RelationshipType::Parent,
        RelationshipType::Bom,
        RelationshipType::Dependency,
        RelationshipType::Plugin,
        RelationshipType::PluginDependency,
        RelationshipType::Extension,
    ];

    /// Whether relationships of this type carry [`ArtifactInfo`].
    pub fn carries_artifact(self) -> bool {
        matches!(
            self,
            RelationshipType::Dependency | RelationshipType::PluginDependency
        )
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationshipType::Parent => write!(f, "PARENT"),
            RelationshipType::Bom => write!(f, "BOM"),
            RelationshipType::Dependency => write!(f, "DEPENDENCY"),
            RelationshipType::Plugin => write!(f, "PLUGIN"),
            RelationshipType::PluginDependency => write!(f, "PLUGIN_DEP"),
            RelationshipType::Extension => write!(f, "EXTENSION"),
        }
    }
}

/// Maven dependency scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyScope {
    /// Default scope
    #[default]
    Compile,
    /// Supplied by the runtime container
    Provided,
    /// Needed at runtime only
    Runtime,
    /// Needed for tests only
    Test,
    /// Provided by the local system
    System,
    /// BOM import (dependency management only)
    Import,
}

impl fmt::Display for DependencyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DependencyScope::Compile => "compile",
            DependencyScope::Provided => "provided",
            DependencyScope::Runtime => "runtime",
            DependencyScope::Test => "test",
            DependencyScope::System => "system",
            DependencyScope::Import => "import",
        };
        f.write_str(name)
    }
}

/// Target-artifact details for dependency and plugin-dependency edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactInfo {
    /// Artifact classifier (`tests`, `sources`, ...)
    pub classifier: Option<String>,
    /// Artifact type (`jar`, `pom`, ...)
    pub artifact_type: String,
    /// Whether the dependency is optional
    pub optional: bool,
    /// Dependency scope
    pub scope: DependencyScope,
    /// Projects excluded from this dependency's transitive closure
    pub exclusions: BTreeSet<ProjectRef>,
}

impl Default for ArtifactInfo {
    fn default() -> Self {
        Self {
            classifier: None,
            artifact_type: "jar".to_string(),
            optional: false,
            scope: DependencyScope::Compile,
            exclusions: BTreeSet::new(),
        }
    }
}

impl ArtifactInfo {
    /// Builder: set the scope.
    pub fn with_scope(mut self, scope: DependencyScope) -> Self {
        self.scope = scope;
        self
    }

    /// Builder: mark optional.
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Builder: set the classifier.
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    /// Builder: add an exclusion.
    pub fn exclude(mut self, project: ProjectRef) -> Self {
        self.exclusions.insert(project);
        self
    }
}

/// Stable identifier derived from a relationship's logical identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationshipId(Uuid);

impl RelationshipId {
    fn for_key(key: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()))
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A directed, typed edge between two projects.
///
/// Logical identity (equality, hashing, [`RelationshipId`]) is
/// `(declaring, target, type, managed)`; provenance and ordering attributes do
/// not take part in it. Relationships are immutable once built: mutation goes
/// through [`Relationship::select_target`] / [`Relationship::select_declaring`],
/// which produce a new logical edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    id: RelationshipId,
    kind: RelationshipType,
    declaring: ProjectVersionRef,
    target: ProjectVersionRef,
    artifact: Option<ArtifactInfo>,
    managed: bool,
    index: u32,
    sources: BTreeSet<String>,
    pom_location: String,
}

impl Relationship {
    /// Start building a relationship of any type.
    pub fn builder(
        kind: RelationshipType,
        declaring: ProjectVersionRef,
        target: ProjectVersionRef,
    ) -> RelationshipBuilder {
        RelationshipBuilder {
            kind,
            declaring,
            target,
            artifact: None,
            managed: false,
            index: 0,
            sources: BTreeSet::new(),
            pom_location: POM_ROOT_LOCATION.to_string(),
        }
    }

    /// `declaring` inherits from `parent`.
    pub fn parent(declaring: ProjectVersionRef, parent: ProjectVersionRef) -> RelationshipBuilder {
        Self::builder(RelationshipType::Parent, declaring, parent)
    }

    /// Terminus sentinel: `declaring` has no parent.
    pub fn terminus(declaring: ProjectVersionRef) -> RelationshipBuilder {
        Self::builder(RelationshipType::Parent, declaring.clone(), declaring)
    }

    /// `declaring` imports the BOM `bom`.
    pub fn bom(declaring: ProjectVersionRef, bom: ProjectVersionRef) -> RelationshipBuilder {
        Self::builder(RelationshipType::Bom, declaring, bom)
    }

    /// `declaring` depends on `target`.
    pub fn dependency(declaring: ProjectVersionRef, target: ProjectVersionRef) -> RelationshipBuilder {
        Self::builder(RelationshipType::Dependency, declaring, target)
    }

    /// `declaring` uses build plugin `plugin`.
    pub fn plugin(declaring: ProjectVersionRef, plugin: ProjectVersionRef) -> RelationshipBuilder {
        Self::builder(RelationshipType::Plugin, declaring, plugin)
    }

    /// A plugin used by `declaring` depends on `target`.
    pub fn plugin_dependency(
        declaring: ProjectVersionRef,
        target: ProjectVersionRef,
    ) -> RelationshipBuilder {
        Self::builder(RelationshipType::PluginDependency, declaring, target)
    }

    /// `declaring` uses build extension `extension`.
    pub fn extension(
        declaring: ProjectVersionRef,
        extension: ProjectVersionRef,
    ) -> RelationshipBuilder {
        Self::builder(RelationshipType::Extension, declaring, extension)
    }

    /// Stable identifier of the logical identity.
    pub fn id(&self) -> RelationshipId {
        self.id
    }

    /// Relationship type.
    pub fn kind(&self) -> RelationshipType {
        self.kind
    }

    /// Declaring project.
    pub fn declaring(&self) -> &ProjectVersionRef {
        &self.declaring
    }

    /// Target project.
    pub fn target(&self) -> &ProjectVersionRef {
        &self.target
    }

    /// Target-artifact details (dependency and plugin-dependency edges only).
    pub fn artifact(&self) -> Option<&ArtifactInfo> {
        self.artifact.as_ref()
    }

    /// Whether this is a management-section declaration.
    pub fn is_managed(&self) -> bool {
        self.managed
    }

    /// Position among same-type relationships declared by the same project.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Provenance URIs.
    pub fn sources(&self) -> &BTreeSet<String> {
        &self.sources
    }

    /// POM location the relationship was declared in.
    pub fn pom_location(&self) -> &str {
        &self.pom_location
    }

    /// Whether `declaring == target`.
    pub fn is_self_referential(&self) -> bool {
        self.declaring == self.target
    }

    /// Whether this is the "no parent" sentinel.
    pub fn is_terminus(&self) -> bool {
        self.kind == RelationshipType::Parent && self.is_self_referential()
    }

    /// Whether the relationship was declared in the project's own POM.
    pub fn is_root_location(&self) -> bool {
        self.pom_location == POM_ROOT_LOCATION
    }

    /// Canonical string of the logical identity.
    pub fn identity_key(&self) -> String {
        identity_key(self.kind, &self.declaring, &self.target, self.managed)
    }

    /// A new logical edge pointing at `target`, everything else preserved.
    pub fn select_target(&self, target: ProjectVersionRef) -> Relationship {
        let mut selected = self.clone();
        selected.target = target;
        selected.refresh_id();
        selected
    }

    /// A new logical edge declared by `declaring`, everything else preserved.
    pub fn select_declaring(&self, declaring: ProjectVersionRef) -> Relationship {
        let mut selected = self.clone();
        selected.declaring = declaring;
        selected.refresh_id();
        selected
    }

    /// Union `sources` into this relationship's provenance.
    ///
    /// Returns whether the set grew.
    pub fn merge_sources<'a>(&mut self, sources: impl IntoIterator<Item = &'a String>) -> bool {
        let before = self.sources.len();
        self.sources.extend(sources.into_iter().cloned());
        self.sources.len() != before
    }

    fn refresh_id(&mut self) {
        self.id = RelationshipId::for_key(&self.identity_key());
    }
}

impl PartialEq for Relationship {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Relationship {}

impl std::hash::Hash for Relationship {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}", self.declaring, self.kind)?;
        if self.managed {
            write!(f, ",managed")?;
        }
        write!(f, "]-> {}", self.target)
    }
}

fn identity_key(
    kind: RelationshipType,
    declaring: &ProjectVersionRef,
    target: &ProjectVersionRef,
    managed: bool,
) -> String {
    format!("{kind}|{declaring}|{target}|{managed}")
}

/// Builder for [`Relationship`].
#[derive(Debug, Clone)]
pub struct RelationshipBuilder {
    kind: RelationshipType,
    declaring: ProjectVersionRef,
    target: ProjectVersionRef,
    artifact: Option<ArtifactInfo>,
    managed: bool,
    index: u32,
    sources: BTreeSet<String>,
    pom_location: String,
}

impl RelationshipBuilder {
    /// Position among same-type relationships of the declaring project.
    pub fn index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    /// Mark as a management-section declaration.
    pub fn managed(mut self, managed: bool) -> Self {
        self.managed = managed;
        self
    }

    /// Add a provenance URI.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.sources.insert(source.into());
        self
    }

    /// Set the POM location.
    pub fn pom_location(mut self, location: impl Into<String>) -> Self {
        self.pom_location = location.into();
        self
    }

    /// Target-artifact details; ignored for types that don't carry them.
    pub fn artifact(mut self, artifact: ArtifactInfo) -> Self {
        self.artifact = Some(artifact);
        self
    }

    /// Finish the relationship.
    pub fn build(self) -> Relationship {
        let artifact = if self.kind.carries_artifact() {
            Some(self.artifact.unwrap_or_default())
        } else {
            None
        };
        let id = RelationshipId::for_key(&identity_key(
            self.kind,
            &self.declaring,
            &self.target,
            self.managed,
        ));
        Relationship {
            id,
            kind: self.kind,
            declaring: self.declaring,
            target: self.target,
            artifact,
            managed: self.managed,
            index: self.index,
            sources: self.sources,
            pom_location: self.pom_location,
        }
    }
}
