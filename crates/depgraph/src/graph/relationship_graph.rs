//! Main RelationshipGraph interface.

use crate::config::{CyclePolicy, GraphConfig};
use crate::cycle::{Cycle, CycleDetector};
use crate::error::{GraphError, Result};
use crate::export;
use crate::membership::ViewMembershipCache;
use crate::model::{ProjectRef, ProjectVersionRef, Relationship, RelationshipId};
use crate::storage::{GraphStore, InsertOutcome, MemoryGraphStore, PersistentGraphStore, StorageBackend};
use crate::traversal::{
    ordering, GraphPath, PathState, RelationshipVisitor, TraversalEngine, TraversalStart,
    TraversalType,
};
use crate::view::{MutationContext, RelationshipView};
use log::{debug, info, trace, warn};
use parking_lot::{Mutex, MutexGuard};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
#[cfg(feature = "rocksdb-backend")]
use std::path::Path;

/// The relationship graph.
///
/// `RelationshipGraph` stores typed relationships between projects and answers
/// view-scoped queries over them. All state sits behind one lock, so the graph
/// is `Send + Sync` and every operation takes `&self`; insertion batches and
/// queries are serialized against each other.
///
/// Visitors passed to [`RelationshipGraph::traverse`] run while the lock is
/// held and must not call back into the graph.
///
/// Every distinct rooted view queried keeps a membership cache (projects,
/// relationships and paths) until [`RelationshipGraph::invalidate_view`],
/// [`RelationshipGraph::invalidate_all`], a deletion or [`RelationshipGraph::close`]
/// drops it. Nothing is evicted otherwise, so callers issuing many one-off
/// views should invalidate them when done; [`RelationshipGraph::cached_view_count`]
/// reports how many are held.
pub struct RelationshipGraph {
    state: Mutex<GraphState>,
    config: GraphConfig,
    global: RelationshipView,
}

struct GraphState {
    store: Box<dyn GraphStore>,
    caches: ViewMembershipCache,
    global_cycles: BTreeSet<Cycle>,
    closed: bool,
}

impl RelationshipGraph {
    /// Create a graph over `store`.
    pub fn with_store(store: Box<dyn GraphStore>, config: GraphConfig) -> Self {
        Self {
            state: Mutex::new(GraphState {
                store,
                caches: ViewMembershipCache::new(),
                global_cycles: BTreeSet::new(),
                closed: false,
            }),
            config,
            global: RelationshipView::global(),
        }
    }

    /// Create an in-memory graph.
    ///
    /// **Warning**: All data is lost when the graph is dropped.
    pub fn in_memory() -> Self {
        Self::in_memory_with_config(GraphConfig::default())
    }

    /// Create an in-memory graph with custom configuration.
    pub fn in_memory_with_config(config: GraphConfig) -> Self {
        Self::with_store(Box::new(MemoryGraphStore::new()), config)
    }

    /// Create a graph persisted through a key/value backend.
    pub fn with_backend(backend: Box<dyn StorageBackend>, config: GraphConfig) -> Self {
        Self::with_store(Box::new(PersistentGraphStore::new(backend)), config)
    }

    /// Open a persistent graph at the given path.
    ///
    /// Uses RocksDB; relationships stored by earlier sessions are visible
    /// immediately.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use depgraph::RelationshipGraph;
    /// use std::path::Path;
    ///
    /// let graph = RelationshipGraph::open(Path::new("./deps.graph")).unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the database cannot be opened.
    #[cfg(feature = "rocksdb-backend")]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, GraphConfig::default())
    }

    /// Open a persistent graph with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the database cannot be opened.
    #[cfg(feature = "rocksdb-backend")]
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: GraphConfig) -> Result<Self> {
        use crate::storage::RocksDBBackend;
        info!("Opening relationship graph at path: {:?}", path.as_ref());
        let backend = RocksDBBackend::open(path)?;
        Ok(Self::with_backend(Box::new(backend), config))
    }

    /// Active configuration.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    fn lock_open(&self) -> Result<MutexGuard<'_, GraphState>> {
        let guard = self.state.lock();
        if guard.closed {
            return Err(GraphError::ConnectionClosed);
        }
        Ok(guard)
    }

    /// Insert relationships.
    ///
    /// Duplicates of stored relationships merge their sources. Self-referential
    /// relationships other than terminal parents are skipped, as are
    /// relationships with unparsable versions (logged). Under
    /// [`CyclePolicy::RejectOnInsert`], relationships that would close a cycle
    /// are not stored; they are returned and their cycles recorded.
    ///
    /// # Errors
    ///
    /// Storage failures abort the batch. Relationships stored before the
    /// failure stay stored, and every view cache is marked stale.
    pub fn add_relationships(
        &self,
        relationships: impl IntoIterator<Item = Relationship>,
    ) -> Result<HashSet<Relationship>> {
        let mut guard = self.lock_open()?;
        let state = &mut *guard;
        let mut batch = InsertBatch::default();

        let outcome = self.store_batch(state, relationships, &mut batch);
        state.caches.mark_cycles_pending();
        if let Err(e) = outcome {
            warn!(
                "Insertion aborted after {} stored relationship(s): {e}",
                batch.inserted.len() + batch.widened.len()
            );
            state.caches.mark_all_pending();
            return Err(e);
        }

        for merged in &batch.widened {
            state.caches.refresh(merged);
        }
        if let Err(e) = state.caches.extend(
            state.store.as_ref(),
            &batch.inserted,
            self.config.default_traversal,
        ) {
            state.caches.mark_all_pending();
            return Err(e);
        }

        debug!(
            "Stored {} relationship(s), widened {}, rejected {}",
            batch.inserted.len(),
            batch.widened.len(),
            batch.rejected.len()
        );
        Ok(batch.rejected)
    }

    fn store_batch(
        &self,
        state: &mut GraphState,
        relationships: impl IntoIterator<Item = Relationship>,
        batch: &mut InsertBatch,
    ) -> Result<()> {
        for rel in relationships {
            if rel.is_self_referential() && !rel.is_terminus() {
                trace!("Skipping self-referential {rel}");
                continue;
            }
            if let Err(e) = rel
                .declaring()
                .version_spec()
                .and_then(|_| rel.target().version_spec())
            {
                warn!("Skipping {rel}: {e}");
                continue;
            }

            if self.config.cycle_policy == CyclePolicy::RejectOnInsert
                && !rel.is_terminus()
                && !state.store.contains_relationship(&rel)?
            {
                let cycles =
                    CycleDetector::new(state.store.as_ref(), &self.global).cycles_through(&rel)?;
                if !cycles.is_empty() {
                    debug!("Rejecting {rel}: closes {} cycle(s)", cycles.len());
                    state.global_cycles.extend(cycles);
                    batch.rejected.insert(rel);
                    continue;
                }
            }

            match state.store.insert_relationship(&rel)? {
                InsertOutcome::Inserted => batch.inserted.push(rel),
                InsertOutcome::Merged { widened: true } => {
                    if let Some(merged) = state.store.relationship(rel.id())? {
                        batch.widened.push(merged);
                    }
                }
                InsertOutcome::Merged { widened: false } => {}
            }
        }
        Ok(())
    }

    /// Remove relationships by logical identity.
    ///
    /// Any removal drops every view cache; there is no incremental shrink.
    ///
    /// # Errors
    ///
    /// Storage failures propagate.
    pub fn delete_relationships(
        &self,
        relationships: impl IntoIterator<Item = Relationship>,
    ) -> Result<usize> {
        let mut guard = self.lock_open()?;
        let state = &mut *guard;
        let mut removed: HashSet<RelationshipId> = HashSet::new();
        for rel in relationships {
            if state.store.remove_relationship(&rel)? {
                removed.insert(rel.id());
            }
        }

        if !removed.is_empty() {
            state.caches.invalidate_all();
            state.global_cycles.retain(|cycle| {
                !cycle
                    .relationships()
                    .iter()
                    .any(|rel| removed.contains(&rel.id()))
            });
            debug!("Removed {} relationship(s); view caches dropped", removed.len());
        }
        Ok(removed.len())
    }

    /// Relationships of the view declared by `project`, in traversal order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ConnectionClosed`] after [`RelationshipGraph::close`].
    pub fn relationships_declared_by(
        &self,
        view: &RelationshipView,
        project: &ProjectVersionRef,
    ) -> Result<Vec<Relationship>> {
        let mut guard = self.lock_open()?;
        let mut rels: Vec<Relationship> = guard
            .view_relationships(view, &self.config)?
            .into_iter()
            .filter(|rel| rel.declaring() == project)
            .collect();
        ordering::sort_relationships(&mut rels);
        Ok(rels)
    }

    /// Relationships of the view targeting `project`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ConnectionClosed`] after [`RelationshipGraph::close`].
    pub fn relationships_targeting(
        &self,
        view: &RelationshipView,
        project: &ProjectVersionRef,
    ) -> Result<Vec<Relationship>> {
        let mut guard = self.lock_open()?;
        let mut rels: Vec<Relationship> = guard
            .view_relationships(view, &self.config)?
            .into_iter()
            .filter(|rel| rel.target() == project)
            .collect();
        ordering::sort_for_listing(&mut rels);
        Ok(rels)
    }

    /// Every relationship of the view.
    ///
    /// Rooted views answer from their membership cache; rootless views scan
    /// the whole store.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ConnectionClosed`] after [`RelationshipGraph::close`].
    pub fn all_relationships(&self, view: &RelationshipView) -> Result<Vec<Relationship>> {
        let mut guard = self.lock_open()?;
        guard.view_relationships(view, &self.config)
    }

    /// Relationships declared by `project` that pass the view's root-level
    /// selection, ignoring path context.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ConnectionClosed`] after [`RelationshipGraph::close`].
    pub fn direct_relationships_from(
        &self,
        view: &RelationshipView,
        project: &ProjectVersionRef,
    ) -> Result<Vec<Relationship>> {
        let guard = self.lock_open()?;
        let store = guard.store.as_ref();
        let mut rels = Vec::new();
        for rel in store.outgoing(project)? {
            if let Some(selected) = select_at_root(store, view, &rel)? {
                rels.push(selected);
            }
        }
        ordering::sort_relationships(&mut rels);
        Ok(rels)
    }

    /// Walk the view from `root`, reporting to `visitor`.
    ///
    /// `root` need not be one of the view's roots.
    ///
    /// # Errors
    ///
    /// Store and mutator failures abort the walk.
    pub fn traverse(
        &self,
        view: &RelationshipView,
        root: &ProjectVersionRef,
        visitor: &mut dyn RelationshipVisitor,
        mode: TraversalType,
    ) -> Result<()> {
        let guard = self.lock_open()?;
        debug!("Traversing {view} from {root} ({mode:?})");
        TraversalEngine::new(guard.store.as_ref(), view).traverse_from(
            vec![TraversalStart::root(root.clone(), view)],
            visitor,
            mode,
        )
    }

    /// Whether storing `candidate` would close a cycle in the global view.
    ///
    /// Nothing is recorded.
    ///
    /// # Errors
    ///
    /// Store failures propagate.
    pub fn introduces_cycle(&self, candidate: &Relationship) -> Result<bool> {
        let guard = self.lock_open()?;
        CycleDetector::new(guard.store.as_ref(), &self.global).introduces_cycle(candidate)
    }

    /// Cycles visible in the view.
    ///
    /// Under [`CyclePolicy::RejectOnInsert`] these are the recorded cycles whose
    /// relationships all pass the view (and, for rooted views, touch its
    /// membership). Under [`CyclePolicy::StoreAndFlag`] detection re-runs over
    /// the view's relationships. Rooted views cache the result until the next
    /// insertion.
    ///
    /// # Errors
    ///
    /// Store failures propagate.
    pub fn cycles_in(&self, view: &RelationshipView) -> Result<BTreeSet<Cycle>> {
        let mut guard = self.lock_open()?;
        let state = &mut *guard;
        let policy = self.config.cycle_policy;

        if !view.has_roots() {
            return match policy {
                CyclePolicy::RejectOnInsert => Ok(state
                    .global_cycles
                    .iter()
                    .filter(|cycle| cycle.relationships().iter().all(|rel| view.accepts(rel)))
                    .cloned()
                    .collect()),
                CyclePolicy::StoreAndFlag => {
                    let rels = state.scan(view, &self.config)?;
                    CycleDetector::new(state.store.as_ref(), view).cycles_among(&rels)
                }
            };
        }

        let store = state.store.as_ref();
        let Some(cache) = state
            .caches
            .membership(store, view, self.config.default_traversal)?
        else {
            return Ok(BTreeSet::new());
        };
        if let Some(cycles) = cache.cycles() {
            return Ok(cycles.clone());
        }

        let cycles: BTreeSet<Cycle> = match policy {
            CyclePolicy::RejectOnInsert => state
                .global_cycles
                .iter()
                .filter(|cycle| {
                    cycle.relationships().iter().all(|rel| view.accepts(rel))
                        && cycle
                            .projects()
                            .iter()
                            .any(|project| cache.data().projects().contains(*project))
                })
                .cloned()
                .collect(),
            CyclePolicy::StoreAndFlag => {
                let rels: Vec<Relationship> = cache.data().relationships().cloned().collect();
                CycleDetector::new(store, view).cycles_among(&rels)?
            }
        };
        debug!("{} cycle(s) in {view}", cycles.len());
        cache.set_cycles(cycles.clone());
        Ok(cycles)
    }

    /// Every cached path of the view ending at one of `targets`.
    ///
    /// Returns `None` (with a warning) for rootless views. Variable targets
    /// never match.
    ///
    /// # Errors
    ///
    /// Store failures during membership recomputation propagate.
    pub fn all_paths_to(
        &self,
        view: &RelationshipView,
        targets: &[ProjectVersionRef],
    ) -> Result<Option<HashSet<GraphPath>>> {
        Ok(self
            .path_map_targeting(view, targets)?
            .map(|paths| paths.into_keys().collect()))
    }

    /// Every cached path of the view ending at one of `targets`, with the
    /// state at its end.
    ///
    /// Returns `None` (with a warning) for rootless views. Variable targets
    /// never match.
    ///
    /// # Errors
    ///
    /// Store failures during membership recomputation propagate.
    pub fn path_map_targeting(
        &self,
        view: &RelationshipView,
        targets: &[ProjectVersionRef],
    ) -> Result<Option<HashMap<GraphPath, PathState>>> {
        let mut guard = self.lock_open()?;
        let state = &mut *guard;
        let Some(cache) = state.caches.membership(
            state.store.as_ref(),
            view,
            self.config.default_traversal,
        )?
        else {
            warn!("Path queries are unsupported without roots ({view})");
            return Ok(None);
        };

        let data = cache.data();
        let mut paths = HashMap::new();
        for target in targets {
            if target.is_variable() {
                trace!("Variable target {target} never matches a path");
                continue;
            }
            for path in data.paths_ending_at(target) {
                if let Some(path_state) = data.paths().get(path) {
                    paths.insert(path.clone(), path_state.clone());
                }
            }
        }
        Ok(Some(paths))
    }

    /// Whether `project` is part of the view.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ConnectionClosed`] after [`RelationshipGraph::close`].
    pub fn contains_project(
        &self,
        view: &RelationshipView,
        project: &ProjectVersionRef,
    ) -> Result<bool> {
        let mut guard = self.lock_open()?;
        Ok(guard.view_projects(view, &self.config)?.contains(project))
    }

    /// Whether the view selects a relationship with the same logical identity.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ConnectionClosed`] after [`RelationshipGraph::close`].
    pub fn contains_relationship(
        &self,
        view: &RelationshipView,
        relationship: &Relationship,
    ) -> Result<bool> {
        let mut guard = self.lock_open()?;
        let state = &mut *guard;
        if let Some(cache) = state.caches.membership(
            state.store.as_ref(),
            view,
            self.config.default_traversal,
        )? {
            return Ok(cache.data().contains_relationship(relationship.id()));
        }
        Ok(state
            .scan(view, &self.config)?
            .iter()
            .any(|rel| rel.id() == relationship.id()))
    }

    /// Build a path from contiguous relationships.
    pub fn create_path(relationships: Vec<Relationship>) -> Option<GraphPath> {
        GraphPath::new(relationships)
    }

    /// Extend `parent` by one relationship.
    pub fn create_child_path(parent: &GraphPath, relationship: Relationship) -> Option<GraphPath> {
        parent.extend(relationship)
    }

    /// Projects along `path`, or `None` if some step is not part of the view.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ConnectionClosed`] after [`RelationshipGraph::close`].
    pub fn path_refs(
        &self,
        view: &RelationshipView,
        path: &GraphPath,
    ) -> Result<Option<Vec<ProjectVersionRef>>> {
        let mut guard = self.lock_open()?;
        let state = &mut *guard;
        let known: HashSet<RelationshipId> = match state.caches.membership(
            state.store.as_ref(),
            view,
            self.config.default_traversal,
        )? {
            Some(cache) => cache.data().relationships().map(Relationship::id).collect(),
            None => state
                .scan(view, &self.config)?
                .iter()
                .map(Relationship::id)
                .collect(),
        };

        if path.relationships().iter().all(|rel| known.contains(&rel.id())) {
            Ok(Some(path.projects()))
        } else {
            Ok(None)
        }
    }

    /// Every project of the view.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ConnectionClosed`] after [`RelationshipGraph::close`].
    pub fn all_projects(&self, view: &RelationshipView) -> Result<BTreeSet<ProjectVersionRef>> {
        let mut guard = self.lock_open()?;
        guard.view_projects(view, &self.config)
    }

    /// Projects of the view with the given `group:artifact`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ConnectionClosed`] after [`RelationshipGraph::close`].
    pub fn projects_matching(
        &self,
        view: &RelationshipView,
        project: &ProjectRef,
    ) -> Result<BTreeSet<ProjectVersionRef>> {
        Ok(self
            .all_projects(view)?
            .into_iter()
            .filter(|p| p.same_project(project))
            .collect())
    }

    /// Projects of the view that declare no relationships in the store.
    ///
    /// # Errors
    ///
    /// Store failures propagate.
    pub fn missing_projects(&self, view: &RelationshipView) -> Result<BTreeSet<ProjectVersionRef>> {
        let mut guard = self.lock_open()?;
        let projects = guard.view_projects(view, &self.config)?;
        let mut missing = BTreeSet::new();
        for project in projects {
            if guard.store.outgoing(&project)?.is_empty() {
                missing.insert(project);
            }
        }
        Ok(missing)
    }

    /// Projects of the view whose version is variable.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ConnectionClosed`] after [`RelationshipGraph::close`].
    pub fn variable_projects(&self, view: &RelationshipView) -> Result<BTreeSet<ProjectVersionRef>> {
        Ok(self
            .all_projects(view)?
            .into_iter()
            .filter(ProjectVersionRef::is_variable)
            .collect())
    }

    /// Drop the cache of one view. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ConnectionClosed`] after [`RelationshipGraph::close`].
    pub fn invalidate_view(&self, view: &RelationshipView) -> Result<bool> {
        let mut guard = self.lock_open()?;
        Ok(guard.caches.invalidate(view))
    }

    /// Number of views currently holding a membership cache.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ConnectionClosed`] after [`RelationshipGraph::close`].
    pub fn cached_view_count(&self) -> Result<usize> {
        Ok(self.lock_open()?.caches.len())
    }

    /// Drop every view cache and the recorded global cycles.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ConnectionClosed`] after [`RelationshipGraph::close`].
    pub fn invalidate_all(&self) -> Result<()> {
        let mut guard = self.lock_open()?;
        guard.caches.invalidate_all();
        guard.global_cycles.clear();
        debug!("All view caches invalidated");
        Ok(())
    }

    /// Render the view as Graphviz DOT.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ConnectionClosed`] after [`RelationshipGraph::close`].
    pub fn export_dot(&self, view: &RelationshipView) -> Result<String> {
        let rels = self.all_relationships(view)?;
        Ok(export::export_dot(&rels, view.roots()))
    }

    /// Render the view as D3-style JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Serialization`] if encoding fails.
    pub fn export_json(&self, view: &RelationshipView) -> Result<String> {
        let rels = self.all_relationships(view)?;
        export::export_json(&rels, view.roots())
    }

    /// Flush pending writes to the store.
    ///
    /// # Errors
    ///
    /// Storage failures propagate.
    pub fn flush(&self) -> Result<()> {
        let mut guard = self.lock_open()?;
        guard.store.flush()
    }

    /// Flush and close the graph; later operations fail with
    /// [`GraphError::ConnectionClosed`]. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Storage failures while flushing propagate; the graph is closed anyway.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.state.lock();
        if guard.closed {
            return Ok(());
        }
        guard.closed = true;
        guard.caches.invalidate_all();
        info!("Closing relationship graph");
        guard.store.flush()
    }

    /// Whether [`RelationshipGraph::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

/// What one insertion batch did.
#[derive(Default)]
struct InsertBatch {
    inserted: Vec<Relationship>,
    widened: Vec<Relationship>,
    rejected: HashSet<Relationship>,
}

impl GraphState {
    /// Selected relationships of the view, listing order.
    fn view_relationships(
        &mut self,
        view: &RelationshipView,
        config: &GraphConfig,
    ) -> Result<Vec<Relationship>> {
        let mut rels = match self
            .caches
            .membership(self.store.as_ref(), view, config.default_traversal)?
        {
            Some(cache) => cache.data().relationships().cloned().collect(),
            None => self.scan(view, config)?,
        };
        ordering::sort_for_listing(&mut rels);
        Ok(rels)
    }

    fn view_projects(
        &mut self,
        view: &RelationshipView,
        config: &GraphConfig,
    ) -> Result<BTreeSet<ProjectVersionRef>> {
        if let Some(cache) = self
            .caches
            .membership(self.store.as_ref(), view, config.default_traversal)?
        {
            return Ok(cache.data().projects().iter().cloned().collect());
        }
        let mut projects = BTreeSet::new();
        for rel in self.scan(view, config)? {
            projects.insert(rel.declaring().clone());
            projects.insert(rel.target().clone());
        }
        Ok(projects)
    }

    /// Full-store scan for rootless views, applying root-level selection.
    fn scan(&self, view: &RelationshipView, config: &GraphConfig) -> Result<Vec<Relationship>> {
        if config.warn_on_full_scan {
            warn!("{view} has no roots; falling back to an expensive full-store scan");
        }
        let store = self.store.as_ref();
        let mut selected = BTreeMap::new();
        for rel in store.all_relationships()? {
            if let Some(sel) = select_at_root(store, view, &rel)? {
                selected.entry(sel.id()).or_insert(sel);
            }
        }
        Ok(selected.into_values().collect())
    }
}

fn select_at_root(
    store: &dyn GraphStore,
    view: &RelationshipView,
    relationship: &Relationship,
) -> Result<Option<Relationship>> {
    if !view.accepts_provenance(relationship) {
        return Ok(None);
    }
    view.root_state().select_relationship(
        relationship,
        &GraphPath::empty(),
        &MutationContext::new(store),
    )
}
