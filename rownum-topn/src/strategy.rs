//! Ordering and hashing strategies over row identifiers.
//!
//! The accumulator only ever needs a total order. "Smaller" means "better":
//! rows that compare less are kept in preference to rows that compare
//! greater. Callers wanting a descending top-N wrap their strategy in
//! [`Reversed`].

use std::cmp::Ordering;

use crate::types::RowId;

/// Total order over row identifiers.
///
/// Implementations must be consistent and transitive over every row id that
/// is ever stored, free of side effects, and safe to call repeatedly.
pub trait RowIdComparisonStrategy {
    fn compare(&self, left: RowId, right: RowId) -> Ordering;
}

impl<F> RowIdComparisonStrategy for F
where
    F: Fn(RowId, RowId) -> Ordering,
{
    #[inline]
    fn compare(&self, left: RowId, right: RowId) -> Ordering {
        self(left, right)
    }
}

/// Orders row ids by their numeric value.
///
/// Useful when the row source hands out ids whose numeric order already
/// matches the ranking (for example, pre-sorted sequence numbers).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl RowIdComparisonStrategy for NaturalOrder {
    #[inline]
    fn compare(&self, left: RowId, right: RowId) -> Ordering {
        left.cmp(&right)
    }
}

/// Inverts another strategy, turning a bottom-N into a top-N.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reversed<S>(pub S);

impl<S: RowIdComparisonStrategy> RowIdComparisonStrategy for Reversed<S> {
    #[inline]
    fn compare(&self, left: RowId, right: RowId) -> Ordering {
        self.0.compare(right, left)
    }
}

/// Equality and hashing over row identifiers.
///
/// The accumulator does not use this; it exists for other consumers of the
/// same row source (for example, distinct or hash-partitioning operators
/// sharing the row handles).
pub trait RowIdHashStrategy {
    fn equals(&self, left: RowId, right: RowId) -> bool;
    fn hash(&self, row_id: RowId) -> u64;
}
