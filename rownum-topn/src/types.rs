//! Identifiers and sentinels shared across the accumulator modules.

/// Stable identifier of a materialized row, chosen by the external row source.
///
/// The accumulator never interprets the bits beyond identity and ordering via
/// a [`RowIdComparisonStrategy`](crate::RowIdComparisonStrategy). Negative
/// values are legal.
pub type RowId = i64;

/// Dense, monotonically discovered partition identifier.
///
/// Referencing group `k` implies groups `0..k` exist (possibly empty).
pub type GroupId = u32;

/// Index of one `top_n`-wide heap slice inside the arena.
pub(crate) type SlotId = u32;

/// Sentinel for "no heap slice assigned".
pub(crate) const EMPTY_SLOT: SlotId = SlotId::MAX;

/// Largest group id the metadata table will address.
///
/// `GroupId::MAX` is excluded so the group count always fits in a `GroupId`.
pub const MAX_GROUP_ID: GroupId = GroupId::MAX - 1;
