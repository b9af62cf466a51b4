//! Error types for ring and relay operations.

use std::io;
use thiserror::Error;

/// Errors returned when a [`Config`](crate::Config) cannot describe a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A ring needs at least one reader.
    #[error("ring needs at least one reader")]
    NoReaders,

    /// Capacity must leave room for one byte of data next to the sentinel.
    #[error("capacity {capacity} is too small (minimum 2 bytes)")]
    CapacityTooSmall {
        /// The rejected capacity.
        capacity: usize,
    },
}

/// Errors returned by [`TeeRing::commit_write`](crate::TeeRing::commit_write)
/// and [`TeeRing::commit_read`](crate::TeeRing::commit_read).
///
/// A failed commit never moves any cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommitError {
    /// The writer tried to publish more bytes than the contiguous span allows.
    #[error("cannot commit write of {requested} bytes, only {available} available")]
    WriteExceedsAvailable {
        /// Number of bytes the caller tried to commit.
        requested: usize,
        /// Contiguous writable bytes at the time of the call.
        available: usize,
    },

    /// A reader tried to release more bytes than its contiguous span holds.
    #[error("reader {reader} cannot commit read of {requested} bytes, only {available} available")]
    ReadExceedsAvailable {
        /// The reader index.
        reader: usize,
        /// Number of bytes the caller tried to commit.
        requested: usize,
        /// Contiguous readable bytes at the time of the call.
        available: usize,
    },

    /// The reader index does not exist on this ring.
    #[error("unknown reader {reader} (ring has {readers})")]
    UnknownReader {
        /// The rejected index.
        reader: usize,
        /// Number of readers the ring was built with.
        readers: usize,
    },
}

impl CommitError {
    /// Returns `true` when the error comes from a caller bug rather than a
    /// transient condition.
    ///
    /// Running out of space is never reported as an error (the availability
    /// queries just return a small span), so every commit error is a bug.
    #[inline]
    pub fn is_caller_bug(&self) -> bool {
        matches!(
            self,
            Self::WriteExceedsAvailable { .. }
                | Self::ReadExceedsAvailable { .. }
                | Self::UnknownReader { .. }
        )
    }
}

/// Errors produced by the [`Relay`](crate::Relay) driver.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The relay configuration was rejected.
    #[error("invalid ring configuration: {0}")]
    Config(#[from] ConfigError),

    /// Reading from the source failed.
    #[error("source read failed: {0}")]
    Source(#[source] io::Error),

    /// Writing to (or flushing) a sink failed.
    #[error("sink {index} failed: {source}")]
    Sink {
        /// Index of the failing sink (same as its reader index).
        index: usize,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A sink accepted zero bytes while data was pending.
    #[error("sink {index} stopped accepting data")]
    SinkClosed {
        /// Index of the closed sink.
        index: usize,
    },
}

impl RelayError {
    /// Returns the sink index this error is about, if any.
    pub fn sink_index(&self) -> Option<usize> {
        match self {
            Self::Sink { index, .. } | Self::SinkClosed { index } => Some(*index),
            _ => None,
        }
    }
}
