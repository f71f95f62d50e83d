//! Per-group heap storage.
//!
//! Layout is struct-of-arrays:
//!
//! ```text
//! group_slots[g]  -> slot s (or EMPTY_SLOT)        chunked, one entry per group
//! group_sizes[g]  -> occupied count                chunked, one entry per group
//! heap_nodes      -> slot s owns [s * top_n, (s + 1) * top_n)
//! ```
//!
//! Heap chunks hold a whole number of slots, so a group's slice never spans
//! two chunks. Slots of drained groups go to a free list and are handed to
//! the next group that needs one; `compact` lowers the slot high-water mark
//! and drops heap chunks that only contain free slots.

use std::mem::size_of;

use rownum_result::{Error, Result};

use crate::big_array::BigArray;
use crate::options::AccumulatorOptions;
use crate::types::{EMPTY_SLOT, GroupId, MAX_GROUP_ID, RowId, SlotId};

/// Reject group ids the metadata table cannot address.
#[inline]
pub(crate) fn check_group_id(group_id: GroupId) -> Result<()> {
    if group_id > MAX_GROUP_ID {
        return Err(Error::InvalidArgumentError(format!(
            "group id {group_id} exceeds maximum {MAX_GROUP_ID}"
        )));
    }
    Ok(())
}

#[derive(Debug)]
pub(crate) struct HeapArena {
    top_n: usize,
    slices_per_chunk: usize,
    group_count: usize,
    group_slots: BigArray<SlotId>,
    group_sizes: BigArray<u32>,
    heap_nodes: BigArray<RowId>,
    /// Slots below this mark have been handed out at least once.
    next_slot: SlotId,
    /// Released slots. `compact` orders them so the lowest slot is reused
    /// first.
    free_slots: Vec<SlotId>,
}

impl HeapArena {
    pub(crate) fn new(options: &AccumulatorOptions) -> Result<Self> {
        options.validate()?;
        let slices_per_chunk = options.heap_slices_per_chunk();
        // At most `heap_chunk_rows` unless a single slice is wider than that.
        let heap_chunk_len = slices_per_chunk * options.top_n;
        Ok(Self {
            top_n: options.top_n,
            slices_per_chunk,
            group_count: 0,
            group_slots: BigArray::new(options.groups_per_chunk, EMPTY_SLOT),
            group_sizes: BigArray::new(options.groups_per_chunk, 0),
            heap_nodes: BigArray::new(heap_chunk_len, 0),
            next_slot: 0,
            free_slots: Vec::new(),
        })
    }

    #[inline]
    pub(crate) fn group_count(&self) -> usize {
        self.group_count
    }

    /// Make `group_id` (and every lower id) addressable. New groups are empty.
    pub(crate) fn ensure_group_exists(&mut self, group_id: GroupId) -> Result<()> {
        check_group_id(group_id)?;
        let needed = group_id as usize + 1;
        if needed <= self.group_count {
            return Ok(());
        }
        let added = self.group_slots.ensure_capacity(needed)?;
        self.group_sizes.ensure_capacity(needed)?;
        if added > 0 {
            tracing::trace!(
                "group table grew by {} chunk(s) to {} entries",
                added,
                self.group_slots.capacity()
            );
        }
        // Entries past the old count were never written, so they still hold
        // the fill values (EMPTY_SLOT / 0).
        self.group_count = needed;
        Ok(())
    }

    /// Occupied count; zero for groups that were never referenced.
    #[inline]
    pub(crate) fn occupied(&self, group_id: GroupId) -> usize {
        let group = group_id as usize;
        if group >= self.group_count {
            return 0;
        }
        self.group_sizes.get(group) as usize
    }

    #[inline]
    pub(crate) fn set_occupied(&mut self, group_id: GroupId, occupied: usize) {
        debug_assert!(occupied <= self.top_n);
        self.group_sizes.set(group_id as usize, occupied as u32);
    }

    #[inline]
    pub(crate) fn slot_of(&self, group_id: GroupId) -> SlotId {
        self.group_slots.get(group_id as usize)
    }

    #[inline]
    fn slot_start(&self, slot: SlotId) -> usize {
        slot as usize * self.top_n
    }

    /// Live portion of the group's heap (`occupied` row ids).
    pub(crate) fn heap(&self, group_id: GroupId) -> &[RowId] {
        let occupied = self.occupied(group_id);
        if occupied == 0 {
            return &[];
        }
        let start = self.slot_start(self.slot_of(group_id));
        self.heap_nodes.range(start, occupied)
    }

    /// Live portion of the group's heap, mutably. The group must be non-empty.
    pub(crate) fn heap_mut(&mut self, group_id: GroupId) -> &mut [RowId] {
        let occupied = self.occupied(group_id);
        let slot = self.slot_of(group_id);
        debug_assert!(slot != EMPTY_SLOT, "heap_mut on a group without a slice");
        let start = self.slot_start(slot);
        self.heap_nodes.range_mut(start, occupied)
    }

    /// Full `top_n`-wide slice for the group, assigning one on first use.
    pub(crate) fn slice_for_insert(&mut self, group_id: GroupId) -> Result<&mut [RowId]> {
        let mut slot = self.slot_of(group_id);
        if slot == EMPTY_SLOT {
            slot = self.acquire_slot()?;
            self.group_slots.set(group_id as usize, slot);
        }
        let start = self.slot_start(slot);
        Ok(self.heap_nodes.range_mut(start, self.top_n))
    }

    fn acquire_slot(&mut self) -> Result<SlotId> {
        if let Some(slot) = self.free_slots.pop() {
            return Ok(slot);
        }
        if self.next_slot == EMPTY_SLOT {
            return Err(Error::ResourceExhausted(format!(
                "heap arena ran out of slot ids ({} slices of {} rows)",
                EMPTY_SLOT, self.top_n
            )));
        }
        let slot = self.next_slot;
        let needed_rows = (slot as usize + 1)
            .checked_mul(self.top_n)
            .ok_or_else(|| {
                Error::ResourceExhausted(format!(
                    "heap arena address space exhausted at slot {slot}"
                ))
            })?;
        // Reserve room to release every slot handed out, so `release` never
        // has to allocate.
        self.free_slots
            .try_reserve(slot as usize + 1 - self.free_slots.len())
            .map_err(|e| Error::resource_exhausted("heap arena free list", e))?;
        let added = self.heap_nodes.ensure_capacity(needed_rows)?;
        if added > 0 {
            tracing::trace!(
                "heap arena grew to {} chunk(s) ({} slices of {} rows)",
                self.heap_nodes.chunk_count(),
                self.heap_nodes.chunk_count() * self.slices_per_chunk,
                self.top_n
            );
        }
        self.next_slot += 1;
        Ok(slot)
    }

    /// Mark the group empty and return its slice to the free list.
    pub(crate) fn release(&mut self, group_id: GroupId) {
        let group = group_id as usize;
        let slot = self.group_slots.get(group);
        self.group_sizes.set(group, 0);
        if slot != EMPTY_SLOT {
            self.group_slots.set(group, EMPTY_SLOT);
            self.free_slots.push(slot);
        }
    }

    /// Lower the slot high-water mark past trailing free slots and drop heap
    /// chunks that no longer hold any slot below it.
    ///
    /// Returns the number of heap chunks released.
    pub(crate) fn compact(&mut self) -> usize {
        if self.free_slots.is_empty() {
            return 0;
        }
        self.free_slots.sort_unstable();
        while let Some(&last) = self.free_slots.last() {
            if last + 1 != self.next_slot {
                break;
            }
            self.free_slots.pop();
            self.next_slot -= 1;
        }
        // Pop from the back hands out the lowest slot first.
        self.free_slots.reverse();

        let chunks_needed = (self.next_slot as usize).div_ceil(self.slices_per_chunk);
        let released = self.heap_nodes.chunk_count().saturating_sub(chunks_needed);
        if released > 0 {
            self.heap_nodes.truncate_chunks(chunks_needed);
        }
        tracing::debug!(
            "heap arena compacted: released {} chunk(s), slot mark now {} ({} free)",
            released,
            self.next_slot,
            self.free_slots.len()
        );
        released
    }

    /// Heap bytes owned by the arena, excluding the struct itself.
    pub(crate) fn allocated_bytes(&self) -> usize {
        self.group_slots.allocated_bytes()
            + self.group_sizes.allocated_bytes()
            + self.heap_nodes.allocated_bytes()
            + self.free_slots.capacity() * size_of::<SlotId>()
    }

    #[cfg(any(test, debug_assertions, feature = "verify"))]
    pub(crate) fn top_n(&self) -> usize {
        self.top_n
    }

    #[cfg(any(test, debug_assertions, feature = "verify"))]
    pub(crate) fn next_slot(&self) -> SlotId {
        self.next_slot
    }

    #[cfg(any(test, debug_assertions, feature = "verify"))]
    pub(crate) fn free_slots(&self) -> &[SlotId] {
        &self.free_slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(top_n: usize, groups_per_chunk: usize, heap_chunk_rows: usize) -> HeapArena {
        let options = AccumulatorOptions::new(top_n)
            .with_groups_per_chunk(groups_per_chunk)
            .with_heap_chunk_rows(heap_chunk_rows);
        HeapArena::new(&options).unwrap()
    }

    #[test]
    fn referencing_a_group_creates_all_lower_groups() {
        let mut arena = arena(2, 4, 8);
        arena.ensure_group_exists(9).unwrap();
        assert_eq!(arena.group_count(), 10);
        for g in 0..10 {
            assert_eq!(arena.occupied(g), 0);
            assert_eq!(arena.slot_of(g), EMPTY_SLOT);
            assert!(arena.heap(g).is_empty());
        }
        // Lower ids do not shrink anything.
        arena.ensure_group_exists(3).unwrap();
        assert_eq!(arena.group_count(), 10);
    }

    #[test]
    fn slices_are_assigned_lazily_and_disjoint() {
        let mut arena = arena(3, 4, 6);
        arena.ensure_group_exists(2).unwrap();
        assert_eq!(arena.next_slot(), 0);

        arena.slice_for_insert(2).unwrap().copy_from_slice(&[1, 2, 3]);
        arena.set_occupied(2, 3);
        arena.slice_for_insert(0).unwrap()[0] = 42;
        arena.set_occupied(0, 1);

        assert_eq!(arena.slot_of(2), 0);
        assert_eq!(arena.slot_of(0), 1);
        assert_eq!(arena.slot_of(1), EMPTY_SLOT);
        assert_eq!(arena.heap(2), &[1, 2, 3]);
        assert_eq!(arena.heap(0), &[42]);
    }

    #[test]
    fn released_slots_are_reused() {
        let mut arena = arena(2, 8, 4);
        arena.ensure_group_exists(1).unwrap();
        arena.slice_for_insert(0).unwrap()[0] = 7;
        arena.set_occupied(0, 1);
        let slot = arena.slot_of(0);

        arena.release(0);
        assert_eq!(arena.occupied(0), 0);
        assert_eq!(arena.slot_of(0), EMPTY_SLOT);
        assert_eq!(arena.free_slots(), &[slot]);

        arena.slice_for_insert(1).unwrap();
        assert_eq!(arena.slot_of(1), slot);
        assert!(arena.free_slots().is_empty());
    }

    #[test]
    fn compact_drops_trailing_free_chunks() {
        // Two slices of two rows per chunk.
        let mut arena = arena(2, 8, 4);
        arena.ensure_group_exists(5).unwrap();
        for g in 0..6 {
            arena.slice_for_insert(g).unwrap();
            arena.set_occupied(g, 1);
        }
        assert_eq!(arena.next_slot(), 6);
        let grown = arena.allocated_bytes();

        // Keep group 1 (slot 1); release the rest.
        for g in [0, 2, 3, 4, 5] {
            arena.release(g);
        }
        let released = arena.compact();
        assert_eq!(released, 2);
        assert_eq!(arena.next_slot(), 2);
        assert_eq!(arena.free_slots(), &[0]);
        assert!(arena.allocated_bytes() < grown);

        // Slot 0 first, then fresh slots above the mark.
        arena.slice_for_insert(4).unwrap();
        assert_eq!(arena.slot_of(4), 0);
        arena.slice_for_insert(5).unwrap();
        assert_eq!(arena.slot_of(5), 2);
    }

    #[test]
    fn compact_with_nothing_free_is_a_no_op() {
        let mut arena = arena(1, 8, 1);
        arena.ensure_group_exists(0).unwrap();
        arena.slice_for_insert(0).unwrap();
        assert_eq!(arena.compact(), 0);
        assert_eq!(arena.next_slot(), 1);
    }
}
