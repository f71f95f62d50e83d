//! Eviction notification.

use crate::types::RowId;

/// Receives each row id displaced from a full group, synchronously and in
/// eviction order.
///
/// Collaborators use this to release whatever the row source holds for the
/// evicted row (page references, variable-width buffers, ...).
pub trait EvictionSink {
    fn evicted(&mut self, row_id: RowId);
}

impl<F> EvictionSink for F
where
    F: FnMut(RowId),
{
    #[inline]
    fn evicted(&mut self, row_id: RowId) {
        self(row_id)
    }
}

/// Sink that records evicted row ids in order.
///
/// Handy when the row source prefers to release evicted rows in batches
/// between input pages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvictionBuffer {
    rows: Vec<RowId>,
}

impl EvictionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[RowId] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Take every buffered row id, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<RowId> {
        std::mem::take(&mut self.rows)
    }
}

impl EvictionSink for EvictionBuffer {
    #[inline]
    fn evicted(&mut self, row_id: RowId) {
        self.rows.push(row_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_preserves_eviction_order() {
        let mut buffer = EvictionBuffer::new();
        buffer.evicted(3);
        buffer.evicted(-1);
        buffer.evicted(3);
        assert_eq!(buffer.as_slice(), &[3, -1, 3]);
        assert_eq!(buffer.take(), vec![3, -1, 3]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn closures_are_sinks() {
        let mut total = 0;
        {
            let mut sink = |row_id: RowId| total += row_id;
            sink.evicted(4);
            sink.evicted(5);
        }
        assert_eq!(total, 9);
    }
}
