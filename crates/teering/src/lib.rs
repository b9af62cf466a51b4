//! teering - Multi-Tail Byte Ring Buffer
//!
//! One producer stream, relayed to N independent consumers that drain at
//! different rates, through a single fixed-size byte array. Nothing is copied
//! on the way: the writer fills a contiguous span in place, each reader
//! drains a contiguous span in place, and the ring only does the bookkeeping.
//!
//! # Key Features
//!
//! - One shared buffer for all readers (no per-reader copies)
//! - The writer is gated by the slowest reader, so no reader loses data
//! - Spans never cross the end of storage, so they can go straight to
//!   `read(2)`/`write(2)` in one call
//! - No allocation after construction, no locking, no blocking
//!
//! The ring has no backpressure policy of its own: when
//! [`TeeRing::available_to_write`] is small, the caller decides whether to
//! wait, drop, or do something else. [`Relay`] is a ready-made driver that
//! waits.
//!
//! # Example
//!
//! ```
//! use teering::{Config, TeeRing};
//!
//! let mut ring = TeeRing::new(Config::default().with_readers(2)).unwrap();
//!
//! // Producer: fill the span in place, then commit what was written.
//! let n = ring.write(b"one stream");
//! assert_eq!(n, 10);
//!
//! // Fast reader drains everything.
//! let mut out = [0u8; 16];
//! assert_eq!(ring.read(0, &mut out), 10);
//!
//! // Slow reader still holds the data back from being overwritten.
//! assert_eq!(ring.space_used(), 10);
//! assert_eq!(ring.readable(1), b"one stream");
//! ```

mod config;
mod cursor;
mod error;
mod invariants;
mod metrics;
mod relay;
mod ring;

pub use config::{Config, RelayConfig, DEFAULT_CAPACITY, LARGE_CONFIG, SMALL_CONFIG};
pub use cursor::{Capacity, Cursor};
pub use error::{CommitError, ConfigError, RelayError};
pub use metrics::Metrics;
pub use relay::{Relay, RelayStats};
pub use ring::TeeRing;
