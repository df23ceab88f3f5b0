//! Per-path traversal state.

use crate::error::Result;
use crate::model::Relationship;
use crate::traversal::GraphPath;
use crate::view::{FilterRef, MutationContext, MutatorRef};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The filter and mutator in effect at a point of a traversal.
///
/// Equality and hashing use the identity of the filter and mutator instances,
/// not their content: two states are equal when they hold the very same
/// objects. [`PathState::child_path_state`] returns a clone of `self` when
/// neither component changes, so long paths under a stable filter share a
/// single state.
#[derive(Clone)]
pub struct PathState {
    inner: Arc<StateInner>,
}

struct StateInner {
    filter: Option<FilterRef>,
    mutator: Option<MutatorRef>,
}

impl PathState {
    /// State holding `filter` and `mutator`; `None` admits or keeps everything.
    pub fn new(filter: Option<FilterRef>, mutator: Option<MutatorRef>) -> Self {
        Self {
            inner: Arc::new(StateInner { filter, mutator }),
        }
    }

    /// Current filter.
    pub fn filter(&self) -> Option<&FilterRef> {
        self.inner.filter.as_ref()
    }

    /// Current mutator.
    pub fn mutator(&self) -> Option<&MutatorRef> {
        self.inner.mutator.as_ref()
    }

    /// Filter then mutate `relationship`, reached via `path`.
    ///
    /// Returns `None` when the filter rejects it.
    ///
    /// # Errors
    ///
    /// Propagates mutator failures.
    pub fn select_relationship(
        &self,
        relationship: &Relationship,
        path: &GraphPath,
        context: &MutationContext<'_>,
    ) -> Result<Option<Relationship>> {
        if let Some(filter) = &self.inner.filter {
            if !filter.accept(relationship) {
                return Ok(None);
            }
        }
        match &self.inner.mutator {
            Some(mutator) => mutator.select(relationship, path, context).map(Some),
            None => Ok(Some(relationship.clone())),
        }
    }

    /// State for the hop below `parent`.
    pub fn child_path_state(&self, parent: &Relationship) -> PathState {
        let filter = self
            .inner
            .filter
            .as_ref()
            .and_then(|f| f.child_filter(parent).filter(|child| !same(child, f)));
        let mutator = self
            .inner
            .mutator
            .as_ref()
            .and_then(|m| m.child_mutator(parent).filter(|child| !same(child, m)));

        if filter.is_none() && mutator.is_none() {
            return self.clone();
        }
        PathState::new(
            filter.or_else(|| self.inner.filter.clone()),
            mutator.or_else(|| self.inner.mutator.clone()),
        )
    }

    /// Whether `other` is the same state instance.
    pub fn is_same_instance(&self, other: &PathState) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn key(&self) -> (usize, usize) {
        (
            self.inner.filter.as_ref().map_or(0, address),
            self.inner.mutator.as_ref().map_or(0, address),
        )
    }
}

impl PartialEq for PathState {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PathState {}

impl Hash for PathState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for PathState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathState")
            .field("filter", &self.inner.filter.as_ref().map(|f| f.long_id()))
            .field("mutator", &self.inner.mutator.as_ref().map(|m| m.long_id()))
            .finish()
    }
}

fn address<T: ?Sized>(arc: &Arc<T>) -> usize {
    Arc::as_ptr(arc) as *const () as usize
}

fn same<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    address(a) == address(b)
}
