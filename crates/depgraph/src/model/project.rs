//! Project identities: `group:artifact` and `group:artifact:version`.

use super::version::VersionSpec;
use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `group:artifact` pair, used for version selections and exclusions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectRef {
    group_id: String,
    artifact_id: String,
}

impl ProjectRef {
    /// Create a new `group:artifact` reference.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidCoordinate`] if either part is empty or
    /// contains `:`, `|` or whitespace.
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Result<Self> {
        let group_id = group_id.into();
        let artifact_id = artifact_id.into();
        if !valid_part(&group_id) || !valid_part(&artifact_id) {
            return Err(GraphError::InvalidCoordinate {
                value: format!("{group_id}:{artifact_id}"),
            });
        }
        Ok(Self {
            group_id,
            artifact_id,
        })
    }

    /// Parse `group:artifact`.
    pub fn parse(value: &str) -> Result<Self> {
        match value.split(':').collect::<Vec<_>>().as_slice() {
            [g, a] => Self::new(*g, *a),
            _ => Err(GraphError::InvalidCoordinate {
                value: value.to_string(),
            }),
        }
    }

    /// Group id.
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Artifact id.
    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    /// Attach a version.
    pub fn with_version(&self, version: impl Into<String>) -> ProjectVersionRef {
        ProjectVersionRef {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// A versioned project identity (GAV).
///
/// Equality, hashing and ordering follow the full coordinate string. The
/// version is stored raw; see [`ProjectVersionRef::version_spec`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectVersionRef {
    group_id: String,
    artifact_id: String,
    version: String,
}

impl ProjectVersionRef {
    /// Create a new GAV.
    ///
    /// The version is not validated here; unparsable versions are reported when
    /// a relationship carrying them is inserted.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidCoordinate`] if group or artifact is malformed.
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        Ok(ProjectRef::new(group_id, artifact_id)?.with_version(version))
    }

    /// Parse `group:artifact:version`.
    ///
    /// Everything after the second `:` is the version.
    pub fn parse(value: &str) -> Result<Self> {
        match value.splitn(3, ':').collect::<Vec<_>>().as_slice() {
            [g, a, v] => Self::new(*g, *a, *v),
            _ => Err(GraphError::InvalidCoordinate {
                value: value.to_string(),
            }),
        }
    }

    /// Group id.
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Artifact id.
    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    /// Raw version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Full `group:artifact:version` coordinate.
    pub fn coordinate(&self) -> String {
        self.to_string()
    }

    /// The versionless `group:artifact` part.
    pub fn project_ref(&self) -> ProjectRef {
        ProjectRef {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
        }
    }

    /// Whether this ref has the same `group:artifact` as `other`.
    pub fn same_project(&self, other: &ProjectRef) -> bool {
        self.group_id == other.group_id && self.artifact_id == other.artifact_id
    }

    /// Parse the version.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidVersion`] when the version cannot be parsed.
    pub fn version_spec(&self) -> Result<VersionSpec> {
        VersionSpec::parse(&self.version)
            .map_err(|reason| GraphError::invalid_version(self.coordinate(), reason))
    }

    /// Whether the version is a range, expression or meta-version.
    ///
    /// Unparsable versions count as variable.
    pub fn is_variable(&self) -> bool {
        self.version_spec().map_or(true, |spec| !spec.is_concrete())
    }

    /// Same project with a different version.
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ProjectVersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

fn valid_part(part: &str) -> bool {
    !part.is_empty() && !part.contains([':', '|']) && !part.chars().any(char::is_whitespace)
}
