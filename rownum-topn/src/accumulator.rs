//! Grouped top-N accumulator.
//!
//! Each group keeps at most `top_n` row ids in a max-heap whose root is the
//! worst row kept so far. A candidate for a full group is compared against
//! that root before anything is materialized, so rejected rows cost one
//! comparison and leave no trace.
//!
//! Per-group lifecycle:
//!
//! ```text
//! Absent --reference--> Empty --add--> Filling (1..N-1) --add--> Full (N)
//!                         ^                                        |
//!                         +---------------- drain_to --------------+
//! ```
//!
//! `Filling` only loses rows through `drain_to`; `Full` swaps its root for a
//! better candidate and reports the displaced row to the eviction sink.

use std::cmp::Ordering;
use std::mem::size_of;

use rownum_result::{Error, Result};

use crate::arena::{HeapArena, check_group_id};
use crate::heap;
use crate::options::AccumulatorOptions;
use crate::row_ref::RowReference;
use crate::sink::EvictionSink;
use crate::strategy::RowIdComparisonStrategy;
use crate::types::{GroupId, RowId};

pub struct GroupedTopNAccumulator<S, E> {
    strategy: S,
    top_n: usize,
    arena: HeapArena,
    sink: E,
    /// Rows currently kept across all groups.
    row_count: usize,
}

impl<S, E> GroupedTopNAccumulator<S, E>
where
    S: RowIdComparisonStrategy,
    E: EvictionSink,
{
    /// Build an accumulator keeping `top_n` rows per group with default
    /// chunk sizing.
    pub fn new(strategy: S, top_n: usize, sink: E) -> Result<Self> {
        Self::with_options(strategy, AccumulatorOptions::new(top_n), sink)
    }

    pub fn with_options(strategy: S, options: AccumulatorOptions, sink: E) -> Result<Self> {
        options.validate()?;
        let arena = HeapArena::new(&options)?;
        tracing::debug!(
            "grouped top-n accumulator created: top_n={}, groups_per_chunk={}, heap_chunk_rows={}",
            options.top_n,
            options.groups_per_chunk,
            options.heap_chunk_rows
        );
        Ok(Self {
            strategy,
            top_n: options.top_n,
            arena,
            sink,
            row_count: 0,
        })
    }

    /// Offer a candidate row to `group_id`.
    ///
    /// Returns `Ok(true)` if the row was kept, in which case
    /// [`RowReference::allocate_row_id`] was called exactly once and, for a
    /// full group, the displaced row id was passed to the eviction sink.
    /// Returns `Ok(false)` without touching the handle or the group when the
    /// group is full and the candidate is not strictly better than its worst
    /// kept row.
    ///
    /// Errors when `group_id` exceeds [`MAX_GROUP_ID`](crate::MAX_GROUP_ID)
    /// or the arena cannot grow; the candidate is then neither materialized
    /// nor kept.
    pub fn add<R: RowReference>(&mut self, group_id: GroupId, row: R) -> Result<bool> {
        self.arena.ensure_group_exists(group_id)?;
        let occupied = self.arena.occupied(group_id);

        if occupied < self.top_n {
            let slice = self.arena.slice_for_insert(group_id)?;
            slice[occupied] = row.allocate_row_id();
            heap::sift_up(&mut slice[..=occupied], occupied, &self.strategy);
            self.arena.set_occupied(group_id, occupied + 1);
            self.row_count += 1;
            return Ok(true);
        }

        let heap = self.arena.heap_mut(group_id);
        let worst = heap[0];
        if row.compare_to(&self.strategy, worst) != Ordering::Less {
            return Ok(false);
        }
        let row_id = row.allocate_row_id();
        tracing::trace!("group {}: evicting row {} for row {}", group_id, worst, row_id);
        self.sink.evicted(worst);
        heap[0] = row_id;
        heap::sift_down(heap, 0, &self.strategy);
        Ok(true)
    }

    /// Append the group's rows to `output`, best first, and empty the group.
    ///
    /// Returns the number of row ids appended. Groups that are empty or were
    /// never referenced yield 0 and are left untouched. The group id stays
    /// valid; its heap slice goes back to the arena for reuse.
    ///
    /// Errors when `group_id` exceeds [`MAX_GROUP_ID`](crate::MAX_GROUP_ID),
    /// the same as `add`.
    pub fn drain_to(&mut self, group_id: GroupId, output: &mut Vec<RowId>) -> Result<usize> {
        check_group_id(group_id)?;
        let occupied = self.arena.occupied(group_id);
        if occupied == 0 {
            return Ok(0);
        }

        let start = output.len();
        output
            .try_reserve(occupied)
            .map_err(|e| Error::resource_exhausted("drain output", e))?;
        output.resize(start + occupied, 0);

        let heap = self.arena.heap_mut(group_id);
        heap::drain_sorted(heap, &self.strategy, &mut output[start..]);
        self.arena.release(group_id);
        self.row_count -= occupied;
        tracing::trace!("group {}: drained {} row(s)", group_id, occupied);
        Ok(occupied)
    }
}

impl<S, E> GroupedTopNAccumulator<S, E> {
    #[inline]
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Number of group ids referenced so far (highest id + 1).
    #[inline]
    pub fn group_count(&self) -> usize {
        self.arena.group_count()
    }

    /// Rows currently kept across all groups.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Rows currently kept for `group_id`; zero for unknown groups.
    #[inline]
    pub fn occupied(&self, group_id: GroupId) -> usize {
        self.arena.occupied(group_id)
    }

    #[inline]
    pub fn is_full(&self, group_id: GroupId) -> bool {
        self.arena.occupied(group_id) == self.top_n
    }

    /// Worst row currently kept for `group_id`, i.e. the row a candidate must
    /// beat once the group is full.
    pub fn peek_worst(&self, group_id: GroupId) -> Option<RowId> {
        self.arena.heap(group_id).first().copied()
    }

    /// Approximate memory footprint in bytes, for external accounting.
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + self.arena.allocated_bytes()
    }

    /// Give back heap chunks that only hold slices of drained groups.
    ///
    /// Returns the number of chunks released. Useful after draining a large
    /// share of the groups when the accumulator will keep running.
    pub fn compact(&mut self) -> usize {
        self.arena.compact()
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn eviction_sink(&self) -> &E {
        &self.sink
    }

    pub fn eviction_sink_mut(&mut self) -> &mut E {
        &mut self.sink
    }

    pub fn into_eviction_sink(self) -> E {
        self.sink
    }
}

#[cfg(any(test, debug_assertions, feature = "verify"))]
impl<S, E> GroupedTopNAccumulator<S, E>
where
    S: RowIdComparisonStrategy,
{
    /// Walk every group and check the heap order plus arena bookkeeping.
    ///
    /// Read-only; returns [`Error::Internal`] describing the first violation.
    pub fn verify_integrity(&self) -> Result<()> {
        use crate::types::EMPTY_SLOT;

        let mut total = 0usize;
        let next_slot = self.arena.next_slot();
        // Slots below the mark are dense, so ownership fits in a bitmap.
        let mut owned = vec![false; next_slot as usize];

        for group in 0..self.arena.group_count() {
            let group_id = group as GroupId;
            let occupied = self.arena.occupied(group_id);
            let slot = self.arena.slot_of(group_id);

            if occupied > self.arena.top_n() {
                return Err(Error::Internal(format!(
                    "group {group_id}: occupied {occupied} exceeds top_n {}",
                    self.arena.top_n()
                )));
            }
            if occupied == 0 {
                if slot != EMPTY_SLOT {
                    return Err(Error::Internal(format!(
                        "group {group_id}: empty group still holds slot {slot}"
                    )));
                }
                continue;
            }
            if slot == EMPTY_SLOT || slot >= next_slot {
                return Err(Error::Internal(format!(
                    "group {group_id}: {occupied} row(s) but invalid slot {slot}"
                )));
            }
            if std::mem::replace(&mut owned[slot as usize], true) {
                return Err(Error::Internal(format!(
                    "group {group_id}: slot {slot} shared with another group"
                )));
            }
            if let Some(position) = heap::find_violation(self.arena.heap(group_id), &self.strategy)
            {
                return Err(Error::Internal(format!(
                    "group {group_id}: heap order violated at position {position}"
                )));
            }
            total += occupied;
        }

        for &slot in self.arena.free_slots() {
            if slot >= next_slot || owned[slot as usize] {
                return Err(Error::Internal(format!(
                    "free slot {slot} is out of range or owned by a group"
                )));
            }
        }

        if total != self.row_count {
            return Err(Error::Internal(format!(
                "row count {} does not match {} row(s) stored",
                self.row_count, total
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::EvictionBuffer;
    use crate::strategy::NaturalOrder;
    use std::cell::Cell;

    /// Handle over a known row id that records whether it was materialized.
    struct Candidate<'a> {
        row_id: RowId,
        extracted: &'a Cell<bool>,
    }

    impl RowReference for Candidate<'_> {
        fn compare_to<S>(&self, strategy: &S, other: RowId) -> Ordering
        where
            S: RowIdComparisonStrategy + ?Sized,
        {
            strategy.compare(self.row_id, other)
        }

        fn allocate_row_id(self) -> RowId {
            self.extracted.set(true);
            self.row_id
        }
    }

    fn offer<S: RowIdComparisonStrategy>(
        acc: &mut GroupedTopNAccumulator<S, EvictionBuffer>,
        group_id: GroupId,
        row_id: RowId,
    ) -> (bool, bool) {
        let extracted = Cell::new(false);
        let kept = acc
            .add(
                group_id,
                Candidate {
                    row_id,
                    extracted: &extracted,
                },
            )
            .unwrap();
        acc.verify_integrity().unwrap();
        (kept, extracted.get())
    }

    fn accumulator(top_n: usize) -> GroupedTopNAccumulator<NaturalOrder, EvictionBuffer> {
        GroupedTopNAccumulator::new(NaturalOrder, top_n, EvictionBuffer::new()).unwrap()
    }

    #[test]
    fn zero_top_n_fails_construction() {
        let result = GroupedTopNAccumulator::new(NaturalOrder, 0, EvictionBuffer::new());
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn rejected_rows_are_not_materialized() {
        let mut acc = accumulator(2);
        assert_eq!(offer(&mut acc, 0, 5), (true, true));
        assert_eq!(offer(&mut acc, 0, 3), (true, true));
        assert_eq!(offer(&mut acc, 0, 5), (false, false));
        assert_eq!(offer(&mut acc, 0, 9), (false, false));
        assert!(acc.eviction_sink().is_empty());
        assert_eq!(acc.peek_worst(0), Some(5));
    }

    #[test]
    fn eviction_reports_the_previous_root() {
        let mut acc = accumulator(3);
        for row_id in [10, 30, 20] {
            offer(&mut acc, 0, row_id);
        }
        assert_eq!(acc.peek_worst(0), Some(30));
        assert_eq!(offer(&mut acc, 0, 25), (true, true));
        assert_eq!(acc.eviction_sink().as_slice(), &[30]);
        assert_eq!(acc.peek_worst(0), Some(25));
        assert_eq!(acc.row_count(), 3);
    }

    #[test]
    fn drain_appends_after_existing_output() {
        let mut acc = accumulator(3);
        for row_id in [7, -1, 4] {
            offer(&mut acc, 1, row_id);
        }
        let mut out = vec![100];
        assert_eq!(acc.drain_to(1, &mut out).unwrap(), 3);
        assert_eq!(out, vec![100, -1, 4, 7]);
        assert_eq!(acc.drain_to(1, &mut out).unwrap(), 0);
        assert_eq!(out.len(), 4);
        assert_eq!(acc.row_count(), 0);
        acc.verify_integrity().unwrap();
    }

    #[test]
    fn drain_of_unknown_group_does_not_create_it() {
        let mut acc = accumulator(1);
        let mut out = Vec::new();
        assert_eq!(acc.drain_to(42, &mut out).unwrap(), 0);
        assert_eq!(acc.group_count(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn drain_rejects_group_ids_add_would_reject() {
        let mut acc = accumulator(1);
        let mut out = Vec::new();
        let add_err = acc
            .add(
                GroupId::MAX,
                Candidate {
                    row_id: 1,
                    extracted: &Cell::new(false),
                },
            )
            .unwrap_err();
        let drain_err = acc.drain_to(GroupId::MAX, &mut out).unwrap_err();
        assert_eq!(add_err, drain_err);
        assert!(out.is_empty());
        assert_eq!(acc.group_count(), 0);
    }

    #[test]
    fn drained_group_can_refill() {
        let mut acc = accumulator(2);
        offer(&mut acc, 0, 1);
        offer(&mut acc, 0, 2);
        let mut out = Vec::new();
        acc.drain_to(0, &mut out).unwrap();

        assert!(!acc.is_full(0));
        assert_eq!(offer(&mut acc, 0, 50), (true, true));
        assert_eq!(acc.occupied(0), 1);
        out.clear();
        acc.drain_to(0, &mut out).unwrap();
        assert_eq!(out, vec![50]);
    }

    #[test]
    fn verify_detects_corrupted_heap() {
        let mut acc = accumulator(3);
        for row_id in [1, 2, 3] {
            offer(&mut acc, 0, row_id);
        }
        // Put the best row at the root behind the accumulator's back.
        let heap = acc.arena.heap_mut(0);
        let best = heap.iter().position(|&r| r == 1).unwrap();
        heap.swap(0, best);
        assert!(matches!(acc.verify_integrity(), Err(Error::Internal(_))));
    }

    #[test]
    fn verify_detects_row_count_drift() {
        let mut acc = accumulator(1);
        offer(&mut acc, 0, 1);
        acc.row_count += 1;
        assert!(matches!(acc.verify_integrity(), Err(Error::Internal(msg)) if msg.contains("row count")));
    }

    #[test]
    fn size_grows_with_groups_and_shrinks_after_compaction() {
        let options = AccumulatorOptions::new(4).with_heap_chunk_rows(8);
        let mut acc =
            GroupedTopNAccumulator::with_options(NaturalOrder, options, EvictionBuffer::new())
                .unwrap();
        let empty = acc.size_of();

        for group_id in 0..16 {
            for row_id in 0..4 {
                offer(&mut acc, group_id, row_id);
            }
        }
        let filled = acc.size_of();
        assert!(filled > empty);

        let mut out = Vec::new();
        for group_id in 0..16 {
            acc.drain_to(group_id, &mut out).unwrap();
        }
        assert_eq!(acc.size_of(), filled, "drain keeps storage until compaction");
        assert_eq!(acc.compact(), 8);
        assert!(acc.size_of() < filled);
        acc.verify_integrity().unwrap();
    }
}
