//! Per-group bounded top-N selection for ranked `ROW_NUMBER()` operators.
//!
//! [`GroupedTopNAccumulator`] keeps, for every group id, the `top_n` best
//! rows seen so far under a caller-supplied [`RowIdComparisonStrategy`]
//! ("smaller" is better). It is the state behind queries like:
//!
//! ```sql
//! SELECT * FROM (
//!   SELECT *, ROW_NUMBER() OVER (PARTITION BY k ORDER BY v) AS rn FROM t
//! ) WHERE rn <= 10
//! ```
//!
//! Candidates arrive as [`RowReference`] handles. A handle is compared
//! against the group's worst kept row first and only materialized
//! (`allocate_row_id`) when it is actually kept, so rows that lose never
//! reach stable storage. Displaced rows are reported to an
//! [`EvictionSink`] as they happen, and [`GroupedTopNAccumulator::drain_to`]
//! emits a group's rows best-first when the input is exhausted.
//!
//! Storage is a chunked arena: one `top_n`-wide heap slice per non-empty
//! group, no per-row allocation, and no monolithic buffer that has to be
//! copied as the group count grows.
//!
//! # Example
//!
//! ```
//! use rownum_topn::{EvictionBuffer, GroupedTopNAccumulator, NaturalOrder, RowId, RowReference};
//! use rownum_topn::RowIdComparisonStrategy;
//! use std::cmp::Ordering;
//!
//! struct Id(RowId);
//!
//! impl RowReference for Id {
//!     fn compare_to<S>(&self, strategy: &S, other: RowId) -> Ordering
//!     where
//!         S: RowIdComparisonStrategy + ?Sized,
//!     {
//!         strategy.compare(self.0, other)
//!     }
//!
//!     fn allocate_row_id(self) -> RowId {
//!         self.0
//!     }
//! }
//!
//! let mut acc = GroupedTopNAccumulator::new(NaturalOrder, 2, EvictionBuffer::new()).unwrap();
//! for (group, row) in [(0, 5), (0, 3), (0, 9), (1, 4), (0, 1)] {
//!     acc.add(group, Id(row)).unwrap();
//! }
//! assert_eq!(acc.eviction_sink().as_slice(), &[5]);
//!
//! let mut out = Vec::new();
//! acc.drain_to(0, &mut out).unwrap();
//! assert_eq!(out, vec![1, 3]);
//! ```
//!
//! # Diagnostics
//!
//! `verify_integrity` walks every group and checks heap order and arena
//! bookkeeping. It is compiled in debug builds, or in release builds with the
//! `verify` feature.
#![forbid(unsafe_code)]

mod accumulator;
mod arena;
mod big_array;
mod heap;
pub mod options;
pub mod row_ref;
pub mod sink;
pub mod strategy;
pub mod types;

pub use accumulator::GroupedTopNAccumulator;
pub use options::AccumulatorOptions;
pub use row_ref::{RowReference, RowReferenceHash};
pub use rownum_result::{Error, Result};
pub use sink::{EvictionBuffer, EvictionSink};
pub use strategy::{NaturalOrder, Reversed, RowIdComparisonStrategy, RowIdHashStrategy};
pub use types::{GroupId, MAX_GROUP_ID, RowId};
