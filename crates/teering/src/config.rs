use crate::error::ConfigError;
use std::time::Duration;

/// Default storage size in bytes (64 KiB, one Linux pipe buffer).
pub const DEFAULT_CAPACITY: usize = 1 << 16;

/// Configuration for a [`TeeRing`](crate::TeeRing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Size of the backing storage in bytes. One byte is always kept free
    /// to tell "empty" from "full", so at most `capacity - 1` bytes are
    /// ever buffered.
    pub capacity: usize,
    /// Number of independent readers (tails).
    pub readers: usize,
    /// Enable metrics collection (slight overhead)
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration with custom settings.
    pub const fn new(capacity: usize, readers: usize, enable_metrics: bool) -> Self {
        Self {
            capacity,
            readers,
            enable_metrics,
        }
    }

    /// Sets the storage size in bytes.
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the number of readers.
    pub const fn with_readers(mut self, readers: usize) -> Self {
        self.readers = readers;
        self
    }

    /// Turns metrics collection on or off.
    pub const fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Checks that a ring can be built from this configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.readers == 0 {
            return Err(ConfigError::NoReaders);
        }
        if self.capacity < 2 {
            return Err(ConfigError::CapacityTooSmall {
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            readers: 1,
            enable_metrics: false,
        }
    }
}

/// Small configuration (4 KiB, one reader), handy for tests and tight loops.
pub const SMALL_CONFIG: Config = Config::new(4096, 1, false);

/// Large configuration (512 KiB, one reader) for bulk file fan-out.
pub const LARGE_CONFIG: Config = Config::new(512 * 1024, 1, false);

/// Configuration for the [`Relay`](crate::Relay) driver loop.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// How long to sleep once spinning and yielding found nothing to do.
    ///
    /// Default: 1ms
    pub poll_interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1),
        }
    }
}

impl RelayConfig {
    /// Sets the idle poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
