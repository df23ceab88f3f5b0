//! [`GraphStore`] laid out over a key/value [`StorageBackend`].
//!
//! Key layout (`|` never occurs in coordinates or versions):
//!
//! ```text
//! rel|{id}                 -> Relationship (JSON)
//! out|{declaring}|{id}     -> RelationshipId (JSON)
//! in|{target}|{id}         -> RelationshipId (JSON)
//! proj|{gav}               -> ProjectVersionRef (JSON)
//! ga|{group:artifact}|{gav} -> ProjectVersionRef (JSON)
//! ```
//!
//! Every insertion or removal is one atomic [`StorageBackend::write_batch`], so a
//! relationship record is never visible without its adjacency keys.

use super::{BatchOperation, GraphStore, InsertOutcome, StorageBackend};
use crate::error::{GraphError, Result};
use crate::model::{ProjectRef, ProjectVersionRef, Relationship, RelationshipId};
use log::trace;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Relationship store persisted through a [`StorageBackend`].
pub struct PersistentGraphStore {
    storage: Box<dyn StorageBackend>,
}

impl PersistentGraphStore {
    /// Wrap a storage backend. Existing data is used as-is.
    pub fn new(storage: Box<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.storage
            .get(key.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn scan<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        self.storage
            .scan_prefix(prefix.as_bytes())?
            .into_iter()
            .map(|(_, value)| decode(&value))
            .collect()
    }

    fn resolve(&self, ids: Vec<RelationshipId>) -> Result<Vec<Relationship>> {
        let mut relationships = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(rel) = self.read(&rel_key(id))? {
                relationships.push(rel);
            }
        }
        Ok(relationships)
    }
}

impl GraphStore for PersistentGraphStore {
    fn insert_relationship(&mut self, relationship: &Relationship) -> Result<InsertOutcome> {
        let id = relationship.id();
        if let Some(mut existing) = self.read::<Relationship>(&rel_key(id))? {
            let widened = existing.merge_sources(relationship.sources());
            if widened {
                self.storage
                    .put(rel_key(id).as_bytes(), &encode(&existing)?)?;
            }
            trace!("Merged sources into {existing} (widened={widened})");
            return Ok(InsertOutcome::Merged { widened });
        }

        let declaring = relationship.declaring();
        let target = relationship.target();
        let id_bytes = encode(&id)?;
        let mut operations = vec![
            put(rel_key(id), encode(relationship)?),
            put(out_key(declaring, id), id_bytes.clone()),
            put(in_key(target, id), id_bytes),
        ];
        for project in [declaring, target] {
            let value = encode(project)?;
            operations.push(put(format!("proj|{project}"), value.clone()));
            operations.push(put(
                format!("ga|{}|{project}", project.project_ref()),
                value,
            ));
        }

        self.storage.write_batch(operations)?;
        Ok(InsertOutcome::Inserted)
    }

    fn remove_relationship(&mut self, relationship: &Relationship) -> Result<bool> {
        let id = relationship.id();
        let Some(stored) = self.read::<Relationship>(&rel_key(id))? else {
            return Ok(false);
        };

        self.storage.write_batch(vec![
            delete(rel_key(id)),
            delete(out_key(stored.declaring(), id)),
            delete(in_key(stored.target(), id)),
        ])?;
        Ok(true)
    }

    fn relationship(&self, id: RelationshipId) -> Result<Option<Relationship>> {
        self.read(&rel_key(id))
    }

    fn contains_project(&self, project: &ProjectVersionRef) -> Result<bool> {
        self.storage.exists(format!("proj|{project}").as_bytes())
    }

    fn outgoing(&self, project: &ProjectVersionRef) -> Result<Vec<Relationship>> {
        let ids = self.scan(&format!("out|{project}|"))?;
        self.resolve(ids)
    }

    fn incoming(&self, project: &ProjectVersionRef) -> Result<Vec<Relationship>> {
        let ids = self.scan(&format!("in|{project}|"))?;
        self.resolve(ids)
    }

    fn projects_matching(&self, project: &ProjectRef) -> Result<Vec<ProjectVersionRef>> {
        self.scan(&format!("ga|{project}|"))
    }

    fn all_projects(&self) -> Result<Vec<ProjectVersionRef>> {
        self.scan("proj|")
    }

    fn all_relationships(&self) -> Result<Vec<Relationship>> {
        self.scan("rel|")
    }

    fn flush(&mut self) -> Result<()> {
        self.storage.flush()
    }
}

fn rel_key(id: RelationshipId) -> String {
    format!("rel|{id}")
}

fn out_key(declaring: &ProjectVersionRef, id: RelationshipId) -> String {
    format!("out|{declaring}|{id}")
}

fn in_key(target: &ProjectVersionRef, id: RelationshipId) -> String {
    format!("in|{target}|{id}")
}

fn put(key: String, value: Vec<u8>) -> BatchOperation {
    BatchOperation::Put {
        key: key.into_bytes(),
        value,
    }
}

fn delete(key: String) -> BatchOperation {
    BatchOperation::Delete {
        key: key.into_bytes(),
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| GraphError::serialization("Failed to serialize graph record", Some(e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| GraphError::serialization("Failed to deserialize graph record", Some(e)))
}
