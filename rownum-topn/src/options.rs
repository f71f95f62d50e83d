//! Construction-time sizing and validation for the accumulator.

use rownum_result::{Error, Result};

/// Group-table entries per metadata chunk.
pub const DEFAULT_GROUPS_PER_CHUNK: usize = 4096;

/// Target row ids per heap-arena chunk. A chunk always holds at least one
/// full heap slice, so very large `top_n` values get one slice per chunk.
pub const DEFAULT_HEAP_CHUNK_ROWS: usize = 64 * 1024;

/// Construction-time configuration for
/// [`GroupedTopNAccumulator`](crate::GroupedTopNAccumulator).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccumulatorOptions {
    /// Rows kept per group. Must be at least 1.
    pub top_n: usize,
    /// Entries per chunk of the per-group metadata tables.
    pub groups_per_chunk: usize,
    /// Target size, in row ids, of each heap-arena chunk.
    pub heap_chunk_rows: usize,
}

impl AccumulatorOptions {
    pub fn new(top_n: usize) -> Self {
        Self {
            top_n,
            ..Self::default()
        }
    }

    pub fn with_groups_per_chunk(mut self, groups_per_chunk: usize) -> Self {
        self.groups_per_chunk = groups_per_chunk;
        self
    }

    pub fn with_heap_chunk_rows(mut self, heap_chunk_rows: usize) -> Self {
        self.heap_chunk_rows = heap_chunk_rows;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(Error::invalid_configuration("top_n must be at least 1"));
        }
        // Occupancy counters are stored as u32.
        if u32::try_from(self.top_n).is_err() {
            return Err(Error::invalid_configuration(format!(
                "top_n {} exceeds the per-group limit of {}",
                self.top_n,
                u32::MAX
            )));
        }
        if self.groups_per_chunk == 0 {
            return Err(Error::invalid_configuration(
                "groups_per_chunk must be non-zero",
            ));
        }
        if self.heap_chunk_rows == 0 {
            return Err(Error::invalid_configuration(
                "heap_chunk_rows must be non-zero",
            ));
        }
        Ok(())
    }

    /// Number of `top_n`-wide heap slices stored in one arena chunk.
    pub(crate) fn heap_slices_per_chunk(&self) -> usize {
        (self.heap_chunk_rows / self.top_n).max(1)
    }
}

impl Default for AccumulatorOptions {
    fn default() -> Self {
        Self {
            top_n: 1,
            groups_per_chunk: DEFAULT_GROUPS_PER_CHUNK,
            heap_chunk_rows: DEFAULT_HEAP_CHUNK_ROWS,
        }
    }
}
