//! Max-heap kernels over one group's slice of row ids.
//!
//! "Max" is relative to the comparison strategy: the root is the row that
//! compares greatest, i.e. the worst row currently kept. Every kernel works
//! on a plain slice whose length is the group's live element count.

use std::cmp::Ordering;

use crate::strategy::RowIdComparisonStrategy;
use crate::types::RowId;

#[inline]
fn parent(index: usize) -> usize {
    (index - 1) / 2
}

#[inline]
fn left_child(index: usize) -> usize {
    2 * index + 1
}

/// Move `heap[index]` toward the root while its parent is better than it.
pub(crate) fn sift_up<S>(heap: &mut [RowId], mut index: usize, strategy: &S)
where
    S: RowIdComparisonStrategy + ?Sized,
{
    while index > 0 {
        let parent = parent(index);
        if strategy.compare(heap[parent], heap[index]) != Ordering::Less {
            break;
        }
        heap.swap(parent, index);
        index = parent;
    }
}

/// Move `heap[index]` toward the leaves while a child is worse than it.
pub(crate) fn sift_down<S>(heap: &mut [RowId], mut index: usize, strategy: &S)
where
    S: RowIdComparisonStrategy + ?Sized,
{
    let len = heap.len();
    loop {
        let left = left_child(index);
        if left >= len {
            break;
        }
        let right = left + 1;
        let mut worse = left;
        if right < len && strategy.compare(heap[right], heap[left]) == Ordering::Greater {
            worse = right;
        }
        if strategy.compare(heap[worse], heap[index]) != Ordering::Greater {
            break;
        }
        heap.swap(worse, index);
        index = worse;
    }
}

/// Empty `heap` into `out` in ascending order (best first).
///
/// Each step swaps the root with the last live element, shrinks the live
/// region by one and restores the heap on what remains; the removed root is
/// written to `out` from the back. `out.len()` must equal `heap.len()`.
pub(crate) fn drain_sorted<S>(heap: &mut [RowId], strategy: &S, out: &mut [RowId])
where
    S: RowIdComparisonStrategy + ?Sized,
{
    debug_assert_eq!(heap.len(), out.len());
    let mut live = heap.len();
    while live > 0 {
        live -= 1;
        out[live] = heap[0];
        heap.swap(0, live);
        sift_down(&mut heap[..live], 0, strategy);
    }
}

/// Position of the first child that is worse than its parent, if any.
#[cfg(any(test, debug_assertions, feature = "verify"))]
pub(crate) fn find_violation<S>(heap: &[RowId], strategy: &S) -> Option<usize>
where
    S: RowIdComparisonStrategy + ?Sized,
{
    (1..heap.len()).find(|&i| strategy.compare(heap[parent(i)], heap[i]) == Ordering::Less)
}
