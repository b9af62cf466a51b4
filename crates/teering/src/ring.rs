use crate::cursor::{Capacity, Cursor};
use crate::invariants::{
    debug_assert_conserved, debug_assert_span_in_bounds, debug_assert_unread_bounded,
};
use crate::{CommitError, Config, ConfigError, Metrics};
use std::fmt;

// =============================================================================
// SPACE ACCOUNTING
// =============================================================================
//
// One writer (head) and N readers (tails) share a single byte array of
// capacity C. Every cursor is a plain offset in [0, C).
//
// ## Wrapped readers
//
// A reader is "wrapped" when its tail sits *after* head in storage
// (`tail > head`): its unread bytes run from tail to the physical end and
// then continue from offset 0 up to head. An unwrapped reader's unread
// bytes are the single run [tail, head).
//
// ## The sentinel byte
//
// head == tail means "nothing to read". To keep that unambiguous the writer
// is never allowed to catch up to a reader from behind, so one byte of
// storage is always sacrificed and a reader is owed at most C - 1 bytes.
//
// ## The constraining reader
//
// The writer only has to respect the reader it would collide with first:
//
// - Any wrapped reader is closer than every unwrapped one, and among wrapped
//   readers the lowest tail is the nearest.
// - With no wrapped reader, head is free to run to the physical end; the
//   lowest tail decides whether the write may land exactly on the origin.
//
// ## Contiguous spans
//
// Both availability queries stop at the physical end of storage. A caller
// hands the span straight to read(2)/write(2) and commits what was actually
// transferred; the next query picks up on the other side of the wrap.
//
// =============================================================================

/// Multi-tail byte ring buffer.
///
/// A single writer appends bytes at `head`; each of N readers consumes the
/// same byte stream through its own `tail`, at its own pace. The writer is
/// held back by the slowest reader, so no reader ever misses data.
///
/// The ring never copies: callers fill [`writable`](Self::writable) and drain
/// [`readable`](Self::readable) in place, then report how much they moved with
/// [`commit_write`](Self::commit_write) / [`commit_read`](Self::commit_read).
///
/// # Example
///
/// ```
/// use teering::{Config, TeeRing};
///
/// let mut ring = TeeRing::new(Config::default().with_readers(2)).unwrap();
///
/// let span = ring.writable();
/// span[..5].copy_from_slice(b"hello");
/// ring.commit_write(5).unwrap();
///
/// assert_eq!(ring.readable(0), b"hello");
/// ring.commit_read(0, 5).unwrap();
///
/// // Reader 1 has not moved, so it still sees the data.
/// assert_eq!(ring.readable(1), b"hello");
/// ```
pub struct TeeRing {
    /// Next byte to be written.
    head: Cursor,
    /// Next byte to be read, one per reader.
    tails: Box<[Cursor]>,
    capacity: Capacity,
    config: Config,
    metrics: Metrics,
    /// Uses `Box<[u8]>`: the buffer is allocated once and never resized.
    storage: Box<[u8]>,
}

impl TeeRing {
    /// Creates a ring with every cursor at the origin.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let capacity = Capacity::new(config.capacity)?;

        tracing::debug!(
            capacity = capacity.get(),
            readers = config.readers,
            metrics = config.enable_metrics,
            "tee ring created"
        );

        Ok(Self {
            head: Cursor::ORIGIN,
            tails: vec![Cursor::ORIGIN; config.readers].into_boxed_slice(),
            capacity,
            config,
            metrics: Metrics::new(config.readers),
            storage: vec![0u8; capacity.get()].into_boxed_slice(),
        })
    }

    /// Creates a default-sized ring with `readers` tails.
    pub fn with_readers(readers: usize) -> Result<Self, ConfigError> {
        Self::new(Config::default().with_readers(readers))
    }

    // ---------------------------------------------------------------------
    // CONSTANTS & STATUS
    // ---------------------------------------------------------------------

    /// Returns the storage size in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Returns the number of readers.
    #[inline]
    pub fn num_readers(&self) -> usize {
        self.tails.len()
    }

    /// Returns the write cursor.
    #[inline]
    pub fn head(&self) -> Cursor {
        self.head
    }

    /// Returns the read cursor of `reader`.
    #[inline]
    pub fn tail(&self, reader: usize) -> Cursor {
        self.tails[reader]
    }

    /// Storage offset the next write lands at.
    #[inline]
    pub fn write_offset(&self) -> usize {
        self.head.offset()
    }

    /// Storage offset `reader` reads from next.
    #[inline]
    pub fn read_offset(&self, reader: usize) -> usize {
        self.tails[reader].offset()
    }

    /// Returns `true` if `reader`'s unread bytes cross the end of storage.
    #[inline]
    pub fn is_wrapped(&self, reader: usize) -> bool {
        self.is_wrapped_at(self.tails[reader])
    }

    #[inline]
    fn is_wrapped_at(&self, tail: Cursor) -> bool {
        tail > self.head
    }

    /// Bytes written but not yet consumed by `reader` (across the wrap).
    #[inline]
    pub fn unread(&self, reader: usize) -> usize {
        self.capacity.distance(self.tails[reader], self.head)
    }

    /// Bytes the writer may still add before `reader` would be overrun.
    #[inline]
    pub fn slack(&self, reader: usize) -> usize {
        self.capacity.usable() - self.unread(reader)
    }

    /// Returns `true` if every reader has caught up with the writer.
    pub fn is_empty(&self) -> bool {
        self.tails.iter().all(|&t| t == self.head)
    }

    /// Returns `true` if the slowest reader leaves no room at all.
    pub fn is_full(&self) -> bool {
        self.space_free() == 0
    }

    /// Traffic counters. All zero unless metrics were enabled.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    // ---------------------------------------------------------------------
    // SPACE ACCOUNTING
    // ---------------------------------------------------------------------

    /// Index of the reader the writer would collide with first.
    ///
    /// Wrapped readers win over unwrapped ones; within a group the lowest
    /// tail wins, and ties go to the lowest index.
    pub fn constraining_reader(&self) -> usize {
        let readers = self.tails.iter().enumerate();
        readers
            .clone()
            .filter(|&(_, &t)| self.is_wrapped_at(t))
            .min_by_key(|&(_, &t)| t)
            .or_else(|| readers.min_by_key(|&(_, &t)| t))
            .map_or(0, |(i, _)| i)
    }

    #[inline]
    fn constraining_tail(&self) -> Cursor {
        self.tails[self.constraining_reader()]
    }

    /// Free bytes in total, as seen by the slowest reader. Diagnostic only.
    pub fn space_free(&self) -> usize {
        let tail = self.constraining_tail();
        let (t, h) = (tail.offset(), self.head.offset());
        if self.is_wrapped_at(tail) {
            t - h - 1
        } else {
            self.capacity() - h + t - 1
        }
    }

    /// Buffered bytes in total, as seen by the slowest reader. Diagnostic only.
    pub fn space_used(&self) -> usize {
        let tail = self.constraining_tail();
        let (t, h) = (tail.offset(), self.head.offset());
        if self.is_wrapped_at(tail) {
            self.capacity() - t + h
        } else {
            h - t
        }
    }

    /// Size of the contiguous span at head that may be written in one go.
    ///
    /// Never crosses the physical end of storage and never eats into any
    /// reader's unread bytes. Zero means the caller has to wait for the
    /// slowest reader.
    pub fn available_to_write(&self) -> usize {
        let tail = self.constraining_tail();
        let t = tail.offset();
        let h = self.head.offset();
        if self.is_wrapped_at(tail) {
            // Stop one short of the reader.
            t - h - 1
        } else if !tail.is_origin() {
            // Run to the end; the next query sees the wrap.
            self.capacity() - h
        } else {
            // Landing on the origin would make head == tail.
            self.capacity() - h - 1
        }
    }

    /// Size of the contiguous span `reader` may consume in one go.
    pub fn available_to_read(&self, reader: usize) -> usize {
        let tail = self.tails[reader];
        if self.is_wrapped_at(tail) {
            self.capacity() - tail.offset()
        } else {
            self.head.offset() - tail.offset()
        }
    }

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    /// The contiguous span at head, exactly [`available_to_write`](Self::available_to_write)
    /// bytes long.
    pub fn writable(&mut self) -> &mut [u8] {
        let start = self.head.offset();
        let len = self.available_to_write();
        debug_assert_span_in_bounds!(start, len, self.capacity());
        &mut self.storage[start..start + len]
    }

    /// Publishes `amount` bytes written into [`writable`](Self::writable).
    ///
    /// Fails without moving head if `amount` exceeds the current writable
    /// span. There are no partial commits: report exactly what was written.
    pub fn commit_write(&mut self, amount: usize) -> Result<(), CommitError> {
        let available = self.available_to_write();
        if amount > available {
            return Err(self.reject(CommitError::WriteExceedsAvailable {
                requested: amount,
                available,
            }));
        }

        self.head = self.head.advance(amount, self.capacity);

        if cfg!(debug_assertions) {
            for reader in 0..self.num_readers() {
                debug_assert_unread_bounded!(reader, self.unread(reader), self.capacity.usable());
            }
            debug_assert_conserved!(self.space_used(), self.space_free(), self.capacity.usable());
        }

        if self.config.enable_metrics {
            self.metrics.record_write(amount);
        }
        Ok(())
    }

    /// Copies as much of `data` as fits in the current writable span and
    /// commits it. Returns the number of bytes taken.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let span = self.writable();
        let n = span.len().min(data.len());
        span[..n].copy_from_slice(&data[..n]);
        // n never exceeds the span we just measured.
        self.commit_write(n).map_or(0, |()| n)
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    /// The contiguous span `reader` may consume, exactly
    /// [`available_to_read`](Self::available_to_read) bytes long.
    pub fn readable(&self, reader: usize) -> &[u8] {
        let start = self.tails[reader].offset();
        let len = self.available_to_read(reader);
        debug_assert_span_in_bounds!(start, len, self.capacity());
        &self.storage[start..start + len]
    }

    /// Releases `amount` bytes consumed by `reader` from [`readable`](Self::readable).
    ///
    /// Fails without moving the tail if `reader` does not exist or `amount`
    /// exceeds its current readable span.
    pub fn commit_read(&mut self, reader: usize, amount: usize) -> Result<(), CommitError> {
        if reader >= self.num_readers() {
            return Err(self.reject(CommitError::UnknownReader {
                reader,
                readers: self.num_readers(),
            }));
        }

        let available = self.available_to_read(reader);
        if amount > available {
            return Err(self.reject(CommitError::ReadExceedsAvailable {
                reader,
                requested: amount,
                available,
            }));
        }

        self.tails[reader] = self.tails[reader].advance(amount, self.capacity);

        debug_assert_conserved!(self.space_used(), self.space_free(), self.capacity.usable());

        if self.config.enable_metrics {
            self.metrics.record_read(reader, amount);
        }
        Ok(())
    }

    /// Copies as much of `reader`'s readable span as fits in `out` and
    /// commits it. Returns the number of bytes copied.
    pub fn read(&mut self, reader: usize, out: &mut [u8]) -> usize {
        let span = self.readable(reader);
        let n = span.len().min(out.len());
        out[..n].copy_from_slice(&span[..n]);
        self.commit_read(reader, n).map_or(0, |()| n)
    }

    fn reject(&mut self, err: CommitError) -> CommitError {
        tracing::debug!(error = %err, head = self.head.offset(), "commit rejected");
        if self.config.enable_metrics {
            self.metrics.record_rejection();
        }
        err
    }
}

impl fmt::Debug for TeeRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeeRing")
            .field("capacity", &self.capacity())
            .field("head", &self.head.offset())
            .field("tails", &self.tails.iter().map(|t| t.offset()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
