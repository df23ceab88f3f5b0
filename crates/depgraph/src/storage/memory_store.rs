//! In-memory multigraph [`GraphStore`].

use super::{GraphStore, InsertOutcome};
use crate::error::Result;
use crate::model::{ProjectRef, ProjectVersionRef, Relationship, RelationshipId};
use log::trace;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Relationship store held entirely in memory.
///
/// Relationships are keyed by id; adjacency indexes give O(1) lookup of a
/// project's out- and in-edges.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    relationships: BTreeMap<RelationshipId, Relationship>,
    adjacency_out: HashMap<ProjectVersionRef, BTreeSet<RelationshipId>>,
    adjacency_in: HashMap<ProjectVersionRef, BTreeSet<RelationshipId>>,
    projects: BTreeSet<ProjectVersionRef>,
    by_project: HashMap<ProjectRef, BTreeSet<ProjectVersionRef>>,
}

impl MemoryGraphStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored relationships.
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Number of known projects.
    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    fn add_project(&mut self, project: &ProjectVersionRef) {
        if self.projects.insert(project.clone()) {
            self.by_project
                .entry(project.project_ref())
                .or_default()
                .insert(project.clone());
        }
    }

    fn resolve(&self, ids: Option<&BTreeSet<RelationshipId>>) -> Vec<Relationship> {
        ids.map(|ids| {
            ids.iter()
                .filter_map(|id| self.relationships.get(id).cloned())
                .collect()
        })
        .unwrap_or_default()
    }
}

impl GraphStore for MemoryGraphStore {
    fn insert_relationship(&mut self, relationship: &Relationship) -> Result<InsertOutcome> {
        let id = relationship.id();
        if let Some(existing) = self.relationships.get_mut(&id) {
            let widened = existing.merge_sources(relationship.sources());
            trace!("Merged sources into {existing} (widened={widened})");
            return Ok(InsertOutcome::Merged { widened });
        }

        self.add_project(relationship.declaring());
        self.add_project(relationship.target());
        self.adjacency_out
            .entry(relationship.declaring().clone())
            .or_default()
            .insert(id);
        self.adjacency_in
            .entry(relationship.target().clone())
            .or_default()
            .insert(id);
        self.relationships.insert(id, relationship.clone());

        Ok(InsertOutcome::Inserted)
    }

    fn remove_relationship(&mut self, relationship: &Relationship) -> Result<bool> {
        let Some(stored) = self.relationships.remove(&relationship.id()) else {
            return Ok(false);
        };

        if let Some(out_edges) = self.adjacency_out.get_mut(stored.declaring()) {
            out_edges.remove(&stored.id());
        }
        if let Some(in_edges) = self.adjacency_in.get_mut(stored.target()) {
            in_edges.remove(&stored.id());
        }

        Ok(true)
    }

    fn relationship(&self, id: RelationshipId) -> Result<Option<Relationship>> {
        Ok(self.relationships.get(&id).cloned())
    }

    fn contains_project(&self, project: &ProjectVersionRef) -> Result<bool> {
        Ok(self.projects.contains(project))
    }

    fn outgoing(&self, project: &ProjectVersionRef) -> Result<Vec<Relationship>> {
        Ok(self.resolve(self.adjacency_out.get(project)))
    }

    fn incoming(&self, project: &ProjectVersionRef) -> Result<Vec<Relationship>> {
        Ok(self.resolve(self.adjacency_in.get(project)))
    }

    fn projects_matching(&self, project: &ProjectRef) -> Result<Vec<ProjectVersionRef>> {
        Ok(self
            .by_project
            .get(project)
            .map(|versions| versions.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn all_projects(&self) -> Result<Vec<ProjectVersionRef>> {
        Ok(self.projects.iter().cloned().collect())
    }

    fn all_relationships(&self) -> Result<Vec<Relationship>> {
        Ok(self.relationships.values().cloned().collect())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
