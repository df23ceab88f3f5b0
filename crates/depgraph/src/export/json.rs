//! JSON format export for D3.js and web visualization tools.
//!
//! Generates JSON with "nodes" and "links" arrays compatible with D3.js force-directed layouts.

use crate::error::{GraphError, Result};
use crate::model::{ProjectVersionRef, Relationship};
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// Export relationships to D3.js-compatible JSON.
///
/// # Errors
///
/// Returns [`GraphError::Serialization`] if encoding fails.
pub fn export_json(
    relationships: &[Relationship],
    roots: &BTreeSet<ProjectVersionRef>,
) -> Result<String> {
    let mut projects: BTreeSet<&ProjectVersionRef> = roots.iter().collect();
    for rel in relationships {
        projects.insert(rel.declaring());
        projects.insert(rel.target());
    }

    let nodes: Vec<Value> = projects
        .iter()
        .map(|project| {
            json!({
                "id": project.to_string(),
                "groupId": project.group_id(),
                "artifactId": project.artifact_id(),
                "version": project.version(),
                "root": roots.contains(*project),
                "variable": project.is_variable(),
            })
        })
        .collect();

    let links: Vec<Value> = relationships.iter().map(relationship_to_json).collect();

    let result = json!({
        "nodes": nodes,
        "links": links,
    });

    serde_json::to_string_pretty(&result)
        .map_err(|e| GraphError::serialization("Failed to serialize JSON export", Some(e)))
}

fn relationship_to_json(rel: &Relationship) -> Value {
    let mut link = json!({
        "id": rel.id().to_string(),
        "source": rel.declaring().to_string(),
        "target": rel.target().to_string(),
        "type": rel.kind().to_string(),
        "managed": rel.is_managed(),
        "index": rel.index(),
        "pomLocation": rel.pom_location(),
        "sources": rel.sources(),
    });
    if let (Some(info), Some(map)) = (rel.artifact(), link.as_object_mut()) {
        map.insert("scope".to_string(), json!(info.scope.to_string()));
        map.insert("optional".to_string(), json!(info.optional));
    }
    link
}
