//! Growable array made of fixed-size chunks.
//!
//! Growing never copies existing elements: a new chunk is appended to the
//! chunk table instead of reallocating one monolithic buffer. Only the chunk
//! table itself (one pointer per chunk) is reallocated as it grows.

use std::mem::size_of;

use rownum_result::{Error, Result};

#[derive(Debug)]
pub(crate) struct BigArray<T> {
    chunk_len: usize,
    fill: T,
    chunks: Vec<Box<[T]>>,
}

impl<T: Copy> BigArray<T> {
    /// `chunk_len` must be non-zero; new elements start out as `fill`.
    pub(crate) fn new(chunk_len: usize, fill: T) -> Self {
        debug_assert!(chunk_len > 0, "chunk_len must be non-zero");
        Self {
            chunk_len,
            fill,
            chunks: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.chunks.len() * self.chunk_len
    }

    /// Append chunks until at least `len` elements are addressable.
    ///
    /// Returns the number of chunks added.
    pub(crate) fn ensure_capacity(&mut self, len: usize) -> Result<usize> {
        let mut added = 0;
        while self.capacity() < len {
            self.push_chunk()?;
            added += 1;
        }
        Ok(added)
    }

    fn push_chunk(&mut self) -> Result<()> {
        self.chunks
            .try_reserve(1)
            .map_err(|e| Error::resource_exhausted("chunk table", e))?;
        let mut chunk = Vec::new();
        chunk
            .try_reserve_exact(self.chunk_len)
            .map_err(|e| Error::resource_exhausted("array chunk", e))?;
        chunk.resize(self.chunk_len, self.fill);
        self.chunks.push(chunk.into_boxed_slice());
        Ok(())
    }

    /// Drop every chunk past the first `chunk_count`.
    pub(crate) fn truncate_chunks(&mut self, chunk_count: usize) {
        self.chunks.truncate(chunk_count);
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> T {
        self.chunks[index / self.chunk_len][index % self.chunk_len]
    }

    #[inline]
    pub(crate) fn set(&mut self, index: usize, value: T) {
        self.chunks[index / self.chunk_len][index % self.chunk_len] = value;
    }

    /// Borrow `len` elements starting at `start`. The range must not cross a
    /// chunk boundary.
    #[inline]
    pub(crate) fn range(&self, start: usize, len: usize) -> &[T] {
        let offset = start % self.chunk_len;
        debug_assert!(offset + len <= self.chunk_len, "range crosses chunk");
        &self.chunks[start / self.chunk_len][offset..offset + len]
    }

    #[inline]
    pub(crate) fn range_mut(&mut self, start: usize, len: usize) -> &mut [T] {
        let offset = start % self.chunk_len;
        debug_assert!(offset + len <= self.chunk_len, "range crosses chunk");
        &mut self.chunks[start / self.chunk_len][offset..offset + len]
    }

    /// Bytes owned on the heap (chunk table plus chunk payloads).
    pub(crate) fn allocated_bytes(&self) -> usize {
        self.chunks.capacity() * size_of::<Box<[T]>>()
            + self.chunks.len() * self.chunk_len * size_of::<T>()
    }
}
