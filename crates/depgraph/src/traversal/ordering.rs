//! Deterministic relationship ordering.
//!
//! A project's out-edges are visited in this order:
//!
//! 1. relationship type ordinal (`PARENT` < `BOM` < `DEPENDENCY` < ...)
//! 2. edges declared in the project's root POM location first
//! 3. an edge whose target is the other's declaring project first (for a
//!    single project's edges this puts the terminal parent first)
//! 4. declaration index
//!
//! Ties are broken by managed flag, target coordinate, then id, so the order
//! is total for any set of edges sharing a declaring project.

use crate::model::Relationship;
use std::cmp::Ordering;

/// Compare two relationships declared by the same project.
pub fn compare_relationships(a: &Relationship, b: &Relationship) -> Ordering {
    a.kind()
        .cmp(&b.kind())
        .then_with(|| b.is_root_location().cmp(&a.is_root_location()))
        .then_with(|| {
            let a_first = a.target() == b.declaring();
            let b_first = b.target() == a.declaring();
            b_first.cmp(&a_first)
        })
        .then_with(|| a.declaring().cmp(b.declaring()))
        .then_with(|| a.index().cmp(&b.index()))
        .then_with(|| a.is_managed().cmp(&b.is_managed()))
        .then_with(|| a.target().cmp(b.target()))
        .then_with(|| a.id().cmp(&b.id()))
}

/// Sort one project's out-edges into traversal order.
pub fn sort_relationships(relationships: &mut [Relationship]) {
    relationships.sort_by(compare_relationships);
}

/// Sort an arbitrary set of relationships: grouped by declaring project, then
/// traversal order within each group.
pub fn sort_for_listing(relationships: &mut [Relationship]) {
    relationships.sort_by(|a, b| {
        a.declaring()
            .cmp(b.declaring())
            .then_with(|| compare_relationships(a, b))
    });
}
