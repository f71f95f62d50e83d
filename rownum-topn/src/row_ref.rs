//! Candidate row handles.
//!
//! A [`RowReference`] is the two-phase contract between the accumulator and
//! the row source: the comparison phase may run any number of times without
//! side effects, and the materialization phase runs at most once, only when
//! the candidate is retained. `allocate_row_id` takes `self` by value, so a
//! handle cannot be materialized twice within one `add` call.

use std::cmp::Ordering;

use crate::strategy::{RowIdComparisonStrategy, RowIdHashStrategy};
use crate::types::RowId;

/// Transient reference to a candidate row, valid for a single `add` call.
///
/// Handles are usually cheap cursors (`&Cursor` or a small `Copy` struct)
/// pointing at a row in a page that has not been copied into stable storage
/// yet.
pub trait RowReference {
    /// Compare the referenced row against an already stored row.
    ///
    /// Must be pure and repeatable.
    fn compare_to<S>(&self, strategy: &S, other: RowId) -> Ordering
    where
        S: RowIdComparisonStrategy + ?Sized;

    /// Extract the row into stable storage and return its identifier.
    fn allocate_row_id(self) -> RowId;
}

/// Hash-side counterpart of [`RowReference`] for consumers that group or
/// deduplicate rows instead of ranking them.
pub trait RowReferenceHash {
    fn equals<H>(&self, strategy: &H, other: RowId) -> bool
    where
        H: RowIdHashStrategy + ?Sized;

    fn hash<H>(&self, strategy: &H) -> u64
    where
        H: RowIdHashStrategy + ?Sized;
}
