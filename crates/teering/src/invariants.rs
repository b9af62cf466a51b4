//! Debug assertion macros for ring buffer invariants.
//!
//! Only active in debug builds (`debug_assert!`), so release builds pay
//! nothing for them.

// =============================================================================
// Bounded unread count
// =============================================================================

/// Assert that a reader is never owed more than `capacity - 1` bytes.
///
/// **Invariant**: `(head - tail + C) mod C <= C - 1`
///
/// Used in: `commit_write()` after moving head
macro_rules! debug_assert_unread_bounded {
    ($reader:expr, $unread:expr, $usable:expr) => {
        debug_assert!(
            $unread <= $usable,
            "unread bound violated: reader {} owed {} bytes, at most {} allowed",
            $reader,
            $unread,
            $usable
        )
    };
}

// =============================================================================
// Conservation
// =============================================================================

/// Assert that used and free space always add up to the usable capacity.
///
/// **Invariant**: `space_used() + space_free() == C - 1`
///
/// Used in: `commit_write()`, `commit_read()`
macro_rules! debug_assert_conserved {
    ($used:expr, $free:expr, $usable:expr) => {
        debug_assert!(
            $used + $free == $usable,
            "conservation violated: used {} + free {} != {}",
            $used,
            $free,
            $usable
        )
    };
}

// =============================================================================
// Contiguous spans
// =============================================================================

/// Assert that a span never runs past the physical end of storage.
///
/// **Invariant**: `offset + len <= C`
///
/// Used in: `writable()`, `readable()`
macro_rules! debug_assert_span_in_bounds {
    ($offset:expr, $len:expr, $capacity:expr) => {
        debug_assert!(
            $offset + $len <= $capacity,
            "span [{}, {}) crosses end of storage ({})",
            $offset,
            $offset + $len,
            $capacity
        )
    };
}

pub(crate) use debug_assert_conserved;
pub(crate) use debug_assert_span_in_bounds;
pub(crate) use debug_assert_unread_bounded;
