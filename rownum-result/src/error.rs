use std::collections::TryReserveError;
use std::fmt;
use thiserror::Error;

/// Unified error type for all rownum operations.
///
/// The accumulator surfaces very few failure modes: bad construction
/// parameters, out-of-range group ids, storage growth failures, and internal
/// invariant violations reported by the integrity walk. Rejecting a candidate
/// row is *not* an error; it is the normal `Ok(false)` outcome of `add`.
///
/// # Error Handling Strategy
///
/// Errors propagate upward using Rust's `?` operator. Callers driving an
/// operator pipeline typically treat [`Error::ResourceExhausted`] and
/// [`Error::Internal`] as fatal for the query, and the remaining variants as
/// planning bugs on their side.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid construction-time configuration.
    ///
    /// Raised when an accumulator is built with:
    /// - a `top_n` of zero
    /// - a zero chunk size for either arena table
    ///
    /// # Recovery
    ///
    /// Fix the options and construct again. No state was created.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Invalid argument passed to an accumulator operation.
    ///
    /// Group ids are unsigned, so negative ids cannot be expressed. This
    /// variant covers ids beyond the addressable group table.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Storage for the per-group arena could not be grown.
    ///
    /// This happens when the allocator refuses a reservation or the slot
    /// index space is exhausted. The row that triggered the growth was not
    /// retained, and no eviction was reported for it. Callers should abort
    /// the query rather than continue with a partially filled accumulator.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Internal error indicating a bug or unexpected state.
    ///
    /// Only produced by the diagnostic integrity walk. It indicates:
    /// - a heap slice whose parent/child order is violated
    /// - an occupancy above the configured capacity
    /// - two live groups sharing one heap slice
    /// - bookkeeping counters that disagree with the stored data
    ///
    /// If you encounter this error, it indicates a bug in the accumulator
    /// (or a comparator that is not a total order).
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid-configuration error from any displayable message.
    ///
    /// # Examples
    ///
    /// ```
    /// use rownum_result::Error;
    ///
    /// let err = Error::invalid_configuration("top_n must be at least 1");
    /// assert!(matches!(err, Error::InvalidConfiguration(msg) if msg.contains("top_n")));
    /// ```
    #[inline]
    pub fn invalid_configuration<M: fmt::Display>(msg: M) -> Self {
        Error::InvalidConfiguration(msg.to_string())
    }

    /// Create a resource-exhausted error describing what could not grow.
    ///
    /// ```
    /// use rownum_result::Error;
    ///
    /// let mut v: Vec<u64> = Vec::new();
    /// let err = v
    ///     .try_reserve_exact(usize::MAX)
    ///     .map_err(|e| Error::resource_exhausted("heap arena chunk", e))
    ///     .unwrap_err();
    /// assert!(matches!(err, Error::ResourceExhausted(msg) if msg.starts_with("heap arena chunk")));
    /// ```
    #[inline]
    pub fn resource_exhausted(what: &str, err: TryReserveError) -> Self {
        Error::ResourceExhausted(format!("{what}: {err}"))
    }
}
