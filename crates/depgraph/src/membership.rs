//! Per-view membership caches.
//!
//! For each rooted view we remember which projects and selected
//! relationships its traversal reaches, and every path that reached them
//! together with the [`PathState`] in effect at the path's end. When new
//! relationships arrive, caches are extended from the paths ending at the new
//! edge's declaring project instead of being rebuilt. A cache with no such
//! path is marked pending and rebuilt on its next use.
//!
//! Rootless views are never cached.

use crate::cycle::Cycle;
use crate::error::Result;
use crate::model::{ProjectVersionRef, Relationship, RelationshipId};
use crate::storage::GraphStore;
use crate::traversal::{
    descends_past, GraphPath, PathState, RelationshipVisitor, TraversalEngine, TraversalStart, TraversalType,
};
use crate::view::RelationshipView;
use log::{debug, trace};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Cached traversal results for one view.
#[derive(Debug, Default)]
pub struct MembershipData {
    projects: HashSet<ProjectVersionRef>,
    relationships: HashMap<RelationshipId, Relationship>,
    paths: HashMap<GraphPath, PathState>,
    paths_ending_at: HashMap<ProjectVersionRef, Vec<GraphPath>>,
}

impl MembershipData {
    /// Projects reached, roots included.
    pub fn projects(&self) -> &HashSet<ProjectVersionRef> {
        &self.projects
    }

    /// Selected relationships reached.
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    /// Whether the selected relationship with `id` was reached.
    pub fn contains_relationship(&self, id: RelationshipId) -> bool {
        self.relationships.contains_key(&id)
    }

    /// Every path recorded, with the state at its end.
    pub fn paths(&self) -> &HashMap<GraphPath, PathState> {
        &self.paths
    }

    /// Paths whose last relationship targets `project`.
    pub fn paths_ending_at(&self, project: &ProjectVersionRef) -> &[GraphPath] {
        self.paths_ending_at
            .get(project)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn clear(&mut self) {
        self.projects.clear();
        self.relationships.clear();
        self.paths.clear();
        self.paths_ending_at.clear();
    }

    fn record(&mut self, relationship: &Relationship, path: &GraphPath, state: &PathState) {
        self.projects.insert(relationship.declaring().clone());
        self.projects.insert(relationship.target().clone());
        self.relationships
            .entry(relationship.id())
            .or_insert_with(|| relationship.clone());
        if self.paths.insert(path.clone(), state.clone()).is_none() {
            self.paths_ending_at
                .entry(relationship.target().clone())
                .or_default()
                .push(path.clone());
        }
    }
}

struct MembershipRecorder<'d> {
    data: &'d mut MembershipData,
}

impl RelationshipVisitor for MembershipRecorder<'_> {
    fn pre_check(&mut self, _relationship: &Relationship, path: &GraphPath) -> bool {
        !self.data.paths.contains_key(path)
    }

    fn edge_traversed(&mut self, relationship: &Relationship, path: &GraphPath, state: &PathState) {
        self.data.record(relationship, path, state);
    }
}

/// Cache entry for a single view.
#[derive(Debug)]
pub struct ViewCache {
    view: RelationshipView,
    data: MembershipData,
    membership_pending: bool,
    cycles: Option<BTreeSet<Cycle>>,
    cycles_pending: bool,
}

impl ViewCache {
    fn new(view: RelationshipView) -> Self {
        Self {
            view,
            data: MembershipData::default(),
            membership_pending: true,
            cycles: None,
            cycles_pending: true,
        }
    }

    /// The cached view.
    pub fn view(&self) -> &RelationshipView {
        &self.view
    }

    /// Membership data; valid once [`ViewMembershipCache::membership`] returned it.
    pub fn data(&self) -> &MembershipData {
        &self.data
    }

    /// Whether membership must be recomputed before use.
    pub fn is_membership_pending(&self) -> bool {
        self.membership_pending
    }

    /// Cached cycles, if computed since the last insertion.
    pub fn cycles(&self) -> Option<&BTreeSet<Cycle>> {
        if self.cycles_pending {
            None
        } else {
            self.cycles.as_ref()
        }
    }

    /// Store freshly computed cycles.
    pub fn set_cycles(&mut self, cycles: BTreeSet<Cycle>) {
        self.cycles = Some(cycles);
        self.cycles_pending = false;
    }

    fn recompute(&mut self, store: &dyn GraphStore, mode: TraversalType) -> Result<()> {
        let Self { view, data, .. } = self;
        data.clear();
        data.projects.extend(view.roots().iter().cloned());

        let mut recorder = MembershipRecorder { data };
        TraversalEngine::new(store, view).traverse(&mut recorder, mode)?;

        self.membership_pending = false;
        debug!(
            "Recomputed membership of {}: {} projects, {} relationships, {} paths",
            self.view,
            self.data.projects.len(),
            self.data.relationships.len(),
            self.data.paths.len()
        );
        Ok(())
    }

    /// Extend membership with a newly stored relationship.
    ///
    /// Only paths the traversal went on below are resumed. Returns `false`
    /// when none of them reaches the relationship's declaring project; the
    /// cache is then marked pending.
    fn extend(
        &mut self,
        store: &dyn GraphStore,
        relationship: &Relationship,
        mode: TraversalType,
    ) -> Result<bool> {
        let declaring = relationship.declaring();
        let mut starts: Vec<TraversalStart> = self
            .data
            .paths_ending_at(declaring)
            .iter()
            .filter(|path| descends_past(path))
            .filter_map(|path| {
                self.data.paths.get(path).map(|state| TraversalStart {
                    node: declaring.clone(),
                    path: path.clone(),
                    state: state.clone(),
                })
            })
            .collect();
        if self.view.roots().contains(declaring) {
            starts.push(TraversalStart::root(declaring.clone(), &self.view));
        }

        if starts.is_empty() {
            trace!("No cached path reaches {declaring} in {}", self.view);
            self.membership_pending = true;
            return Ok(false);
        }

        let Self { view, data, .. } = self;
        let engine = TraversalEngine::new(store, view);
        let mut recorder = MembershipRecorder { data };
        for start in starts {
            engine.traverse_edges(start, vec![relationship.clone()], &mut recorder, mode)?;
        }
        Ok(true)
    }
}

/// Registry of view caches, keyed by view id.
///
/// Entries live until invalidated; nothing evicts them.
#[derive(Debug, Default)]
pub struct ViewMembershipCache {
    views: HashMap<String, ViewCache>,
}

impl ViewMembershipCache {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached views.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Whether no view is cached.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// The cache for `view`, created if missing; `None` for rootless views.
    pub fn entry(&mut self, view: &RelationshipView) -> Option<&mut ViewCache> {
        if !view.has_roots() {
            return None;
        }
        Some(
            self.views
                .entry(view.id().to_string())
                .or_insert_with(|| ViewCache::new(view.clone())),
        )
    }

    /// Up-to-date membership for `view`; `None` for rootless views.
    ///
    /// # Errors
    ///
    /// Store and mutator failures during recomputation propagate.
    pub fn membership(
        &mut self,
        store: &dyn GraphStore,
        view: &RelationshipView,
        mode: TraversalType,
    ) -> Result<Option<&mut ViewCache>> {
        let Some(cache) = self.entry(view) else {
            return Ok(None);
        };
        if cache.membership_pending {
            cache.recompute(store, mode)?;
        }
        Ok(Some(cache))
    }

    /// Extend every up-to-date cache with newly stored `relationships`.
    ///
    /// # Errors
    ///
    /// Store and mutator failures propagate.
    pub fn extend(
        &mut self,
        store: &dyn GraphStore,
        relationships: &[Relationship],
        mode: TraversalType,
    ) -> Result<()> {
        for cache in self.views.values_mut() {
            for rel in relationships {
                if cache.membership_pending {
                    break;
                }
                // management can change what a mutator selects on cached paths
                if rel.is_managed() && cache.view.root_state().mutator().is_some() {
                    cache.membership_pending = true;
                    break;
                }
                cache.extend(store, rel, mode)?;
            }
        }
        Ok(())
    }

    /// Rebuild, on next use, every cache that reaches the declaring project
    /// of `relationship`, a stored relationship whose sources were widened.
    ///
    /// Cached paths hold copies of the relationships on them, so the merged
    /// provenance only shows up after recomputation. Caches that never reach
    /// the declaring project cannot contain the relationship.
    pub fn refresh(&mut self, relationship: &Relationship) {
        for cache in self.views.values_mut() {
            if !cache.membership_pending
                && cache.data.projects.contains(relationship.declaring())
            {
                trace!("{relationship} widened; {} pending", cache.view);
                cache.membership_pending = true;
            }
        }
    }

    /// Mark every cache stale, membership and cycles alike.
    pub fn mark_all_pending(&mut self) {
        for cache in self.views.values_mut() {
            cache.membership_pending = true;
            cache.cycles_pending = true;
        }
    }

    /// Mark every cached cycle set stale.
    pub fn mark_cycles_pending(&mut self) {
        for cache in self.views.values_mut() {
            cache.cycles_pending = true;
        }
    }

    /// Drop the cache of `view`. Returns whether one existed.
    pub fn invalidate(&mut self, view: &RelationshipView) -> bool {
        self.views.remove(view.id()).is_some()
    }

    /// Drop every cache.
    pub fn invalidate_all(&mut self) {
        self.views.clear();
    }
}
