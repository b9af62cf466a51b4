//! Moving bytes between `std::io` endpoints and a [`TeeRing`].
//!
//! [`TeeRing::fill_from`] and [`TeeRing::drain_to`] are the producer and
//! consumer seams: one `read`/`write` call straight into or out of a ring
//! span, followed by a commit of whatever the call actually moved.
//!
//! [`Relay`] is a single-threaded driver built on those seams. It pumps one
//! source into N sinks, treating `WouldBlock` as "not ready yet", and backs
//! off (spin, yield, then sleep) when a whole pass makes no progress.

use crate::{Config, RelayConfig, RelayError, TeeRing};
use crossbeam_utils::Backoff;
use std::io::{self, ErrorKind, Read, Write};
use std::thread;

impl TeeRing {
    /// Reads once from `source` into the writable span and commits the count.
    ///
    /// Returns `Ok(0)` without touching `source` when there is no room, so
    /// check [`available_to_write`](Self::available_to_write) first if you
    /// need to tell a full ring from end-of-file.
    pub fn fill_from<R: Read + ?Sized>(&mut self, source: &mut R) -> io::Result<usize> {
        let span = self.writable();
        if span.is_empty() {
            return Ok(0);
        }
        let n = source.read(span)?;
        self.commit_write(n)
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, e))?;
        Ok(n)
    }

    /// Writes `reader`'s readable span to `sink` once and commits the count.
    ///
    /// Returns `Ok(0)` without touching `sink` when the reader is caught up.
    pub fn drain_to<W: Write + ?Sized>(
        &mut self,
        reader: usize,
        sink: &mut W,
    ) -> io::Result<usize> {
        let span = self.readable(reader);
        if span.is_empty() {
            return Ok(0);
        }
        let n = sink.write(span)?;
        self.commit_read(reader, n)
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, e))?;
        Ok(n)
    }
}

/// Totals reported by [`Relay::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Bytes taken from the source.
    pub bytes_in: u64,
    /// Bytes delivered, indexed by sink.
    pub bytes_out: Vec<u64>,
    /// Driver passes, including idle ones.
    pub passes: u64,
}

/// Fans one byte source out to several sinks through a [`TeeRing`].
///
/// Sink `i` is served by ring reader `i`. A slow sink holds back the source
/// but never the other sinks, up to the ring's capacity.
///
/// # Example
///
/// ```
/// use teering::{Config, Relay};
///
/// let source: &[u8] = b"fan me out";
/// let sinks = vec![Vec::<u8>::new(), Vec::new()];
/// let mut relay = Relay::new(source, sinks, Config::default()).unwrap();
/// let stats = relay.run().unwrap();
///
/// assert_eq!(stats.bytes_in, 10);
/// let sinks = relay.into_sinks();
/// assert_eq!(sinks[0], b"fan me out");
/// assert_eq!(sinks[1], b"fan me out");
/// ```
pub struct Relay<R, W> {
    source: R,
    sinks: Vec<W>,
    ring: TeeRing,
    config: RelayConfig,
    stats: RelayStats,
    eof: bool,
}

impl<R: Read, W: Write> Relay<R, W> {
    /// Creates a relay whose ring has one reader per sink.
    ///
    /// `config.readers` is overridden by `sinks.len()`.
    pub fn new(source: R, sinks: Vec<W>, config: Config) -> Result<Self, RelayError> {
        Self::with_relay_config(source, sinks, config, RelayConfig::default())
    }

    /// Creates a relay with custom idle behaviour.
    pub fn with_relay_config(
        source: R,
        sinks: Vec<W>,
        config: Config,
        relay_config: RelayConfig,
    ) -> Result<Self, RelayError> {
        let ring = TeeRing::new(config.with_readers(sinks.len()))?;
        let stats = RelayStats {
            bytes_out: vec![0; sinks.len()],
            ..RelayStats::default()
        };
        Ok(Self {
            source,
            sinks,
            ring,
            config: relay_config,
            stats,
            eof: false,
        })
    }

    /// Returns the underlying ring.
    pub fn ring(&self) -> &TeeRing {
        &self.ring
    }

    /// Returns the totals so far.
    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// Returns `true` once the source hit EOF and every sink caught up.
    pub fn is_finished(&self) -> bool {
        self.eof && self.ring.is_empty()
    }

    /// Consumes the relay and returns its sinks.
    pub fn into_sinks(self) -> Vec<W> {
        self.sinks
    }

    /// Runs until the source is exhausted and every sink has all its bytes,
    /// then flushes the sinks.
    pub fn run(&mut self) -> Result<RelayStats, RelayError> {
        let backoff = Backoff::new();

        while !self.is_finished() {
            if self.step()? {
                backoff.reset();
            } else if backoff.is_completed() {
                thread::sleep(self.config.poll_interval);
            } else {
                backoff.snooze();
            }
        }

        for (index, sink) in self.sinks.iter_mut().enumerate() {
            sink.flush().map_err(|source| RelayError::Sink { index, source })?;
        }

        tracing::info!(
            bytes_in = self.stats.bytes_in,
            passes = self.stats.passes,
            sinks = self.sinks.len(),
            "relay finished"
        );
        Ok(self.stats.clone())
    }

    /// Runs one pass: at most one source read, then at most one write per sink.
    ///
    /// Returns `true` if any endpoint moved bytes (or the source hit EOF).
    pub fn step(&mut self) -> Result<bool, RelayError> {
        self.stats.passes += 1;
        let mut progressed = self.pump_source()?;

        for index in 0..self.sinks.len() {
            progressed |= self.pump_sink(index)?;
        }

        tracing::trace!(
            pass = self.stats.passes,
            progressed,
            buffered = self.ring.space_used(),
            "relay pass"
        );
        Ok(progressed)
    }

    fn pump_source(&mut self) -> Result<bool, RelayError> {
        if self.eof || self.ring.available_to_write() == 0 {
            return Ok(false);
        }
        loop {
            match self.ring.fill_from(&mut self.source) {
                Ok(0) => {
                    tracing::debug!(bytes_in = self.stats.bytes_in, "source reached EOF");
                    self.eof = true;
                    return Ok(true);
                }
                Ok(n) => {
                    self.stats.bytes_in += n as u64;
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(false),
                Err(e) => return Err(RelayError::Source(e)),
            }
        }
    }

    fn pump_sink(&mut self, index: usize) -> Result<bool, RelayError> {
        if self.ring.available_to_read(index) == 0 {
            return Ok(false);
        }
        loop {
            match self.ring.drain_to(index, &mut self.sinks[index]) {
                Ok(0) => return Err(RelayError::SinkClosed { index }),
                Ok(n) => {
                    self.stats.bytes_out[index] += n as u64;
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(false),
                Err(source) => return Err(RelayError::Sink { index, source }),
            }
        }
    }
}
