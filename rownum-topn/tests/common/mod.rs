#![allow(dead_code)]

use std::cell::Cell;
use std::cmp::Ordering;

use rownum_topn::{
    EvictionBuffer, GroupId, GroupedTopNAccumulator, NaturalOrder, RowId,
    RowIdComparisonStrategy, RowIdHashStrategy, RowReference, RowReferenceHash,
};

/// Reusable candidate handle that records how often it was materialized.
///
/// Point it at a row with [`TestingRowReference::set_row_id`] and pass
/// `&reference` to `add`.
#[derive(Debug, Default)]
pub struct TestingRowReference {
    row_id: Cell<RowId>,
    allocations: Cell<u32>,
}

impl TestingRowReference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_row_id(&self, row_id: RowId) {
        self.row_id.set(row_id);
        self.allocations.set(0);
    }

    pub fn is_row_id_extracted(&self) -> bool {
        self.allocations.get() > 0
    }

    pub fn allocations(&self) -> u32 {
        self.allocations.get()
    }
}

impl RowReference for &TestingRowReference {
    fn compare_to<S>(&self, strategy: &S, other: RowId) -> Ordering
    where
        S: RowIdComparisonStrategy + ?Sized,
    {
        strategy.compare(self.row_id.get(), other)
    }

    fn allocate_row_id(self) -> RowId {
        self.allocations.set(self.allocations.get() + 1);
        self.row_id.get()
    }
}

impl RowReferenceHash for &TestingRowReference {
    fn equals<H>(&self, strategy: &H, other: RowId) -> bool
    where
        H: RowIdHashStrategy + ?Sized,
    {
        strategy.equals(self.row_id.get(), other)
    }

    fn hash<H>(&self, strategy: &H) -> u64
    where
        H: RowIdHashStrategy + ?Sized,
    {
        strategy.hash(self.row_id.get())
    }
}

pub type TestAccumulator = GroupedTopNAccumulator<NaturalOrder, EvictionBuffer>;

pub fn natural_accumulator(top_n: usize) -> TestAccumulator {
    rownum_test_utils::init_tracing_for_tests();
    let acc = GroupedTopNAccumulator::new(NaturalOrder, top_n, EvictionBuffer::new())
        .expect("valid accumulator options");
    acc.verify_integrity().expect("fresh accumulator is consistent");
    acc
}

/// Offer `row_id` to `group_id`, check integrity, and return whether it was kept.
pub fn offer<S: RowIdComparisonStrategy>(
    acc: &mut GroupedTopNAccumulator<S, EvictionBuffer>,
    reference: &TestingRowReference,
    group_id: GroupId,
    row_id: RowId,
) -> bool {
    reference.set_row_id(row_id);
    let kept = acc.add(group_id, reference).expect("add");
    acc.verify_integrity().expect("integrity after add");
    assert_eq!(
        reference.allocations(),
        u32::from(kept),
        "row {row_id}: materialized {} time(s) but kept = {kept}",
        reference.allocations()
    );
    kept
}

pub fn drain<S: RowIdComparisonStrategy>(
    acc: &mut GroupedTopNAccumulator<S, EvictionBuffer>,
    group_id: GroupId,
) -> Vec<RowId> {
    let mut out = Vec::new();
    let written = acc.drain_to(group_id, &mut out).expect("drain");
    assert_eq!(written, out.len());
    acc.verify_integrity().expect("integrity after drain");
    out
}
