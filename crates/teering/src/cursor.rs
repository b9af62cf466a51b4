//! Bounded index types for the ring's head and tails.
//!
//! Every cursor lives in `[0, capacity)`. Advancing a cursor wraps modulo
//! the capacity, so the arithmetic for "where does this cursor go next"
//! lives in one place instead of being repeated at every call site.

use crate::error::ConfigError;

/// Storage size of a ring, validated to be at least 2 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Capacity(usize);

impl Capacity {
    /// Wraps a byte count, rejecting sizes that leave no usable byte beside
    /// the sentinel.
    pub fn new(bytes: usize) -> Result<Self, ConfigError> {
        if bytes < 2 {
            return Err(ConfigError::CapacityTooSmall { capacity: bytes });
        }
        Ok(Self(bytes))
    }

    /// Returns the size in bytes.
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Largest number of bytes that can ever be buffered for one reader.
    #[inline]
    pub const fn usable(self) -> usize {
        self.0 - 1
    }

    /// Distance travelled going forward from `from` to `to`, wrapping at the
    /// physical end of storage.
    #[inline]
    pub fn distance(self, from: Cursor, to: Cursor) -> usize {
        if to.0 >= from.0 {
            to.0 - from.0
        } else {
            self.0 - from.0 + to.0
        }
    }
}

/// An offset into ring storage, always in `[0, capacity)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor(usize);

impl Cursor {
    /// The storage origin.
    pub const ORIGIN: Self = Self(0);

    /// Returns the raw storage offset.
    #[inline]
    pub const fn offset(self) -> usize {
        self.0
    }

    /// Returns `true` if the cursor sits at the storage origin.
    #[inline]
    pub const fn is_origin(self) -> bool {
        self.0 == 0
    }

    /// Moves the cursor forward by `amount`, wrapping modulo `capacity`.
    #[inline]
    #[must_use]
    pub fn advance(self, amount: usize, capacity: Capacity) -> Self {
        debug_assert!(self.0 < capacity.get(), "cursor {} out of bounds", self.0);
        Self((self.0 + amount % capacity.get()) % capacity.get())
    }
}
