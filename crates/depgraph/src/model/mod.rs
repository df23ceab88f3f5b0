//! Graph data model.
//!
//! - [`ProjectVersionRef`]: graph nodes (GAV identities)
//! - [`Relationship`]: typed, provenance-tagged edges
//! - [`VersionSpec`]: parsed version specifiers

mod project;
mod relationship;
mod version;

pub use project::{ProjectRef, ProjectVersionRef};
pub use relationship::{
    ArtifactInfo, DependencyScope, Relationship, RelationshipBuilder, RelationshipId,
    RelationshipType, ANY_SOURCE, POM_ROOT_LOCATION,
};
pub use version::{VersionRange, VersionSpec};
