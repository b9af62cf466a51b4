/// Optional counters for monitoring ring traffic.
///
/// Collected only when [`Config::enable_metrics`](crate::Config::enable_metrics)
/// is set; otherwise [`TeeRing::metrics`](crate::TeeRing::metrics) stays
/// all zeroes. Sized once at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metrics {
    pub bytes_written: u64,
    pub writes_committed: u64,
    /// Bytes released, indexed by reader.
    pub bytes_read: Vec<u64>,
    pub reads_committed: u64,
    pub rejected_commits: u64,
}

impl Metrics {
    pub fn new(readers: usize) -> Self {
        Self {
            bytes_read: vec![0; readers],
            ..Self::default()
        }
    }

    /// Bytes the given reader is behind the writer in total traffic.
    pub fn lag(&self, reader: usize) -> u64 {
        self.bytes_written
            .saturating_sub(self.bytes_read.get(reader).copied().unwrap_or(0))
    }

    pub(crate) fn record_write(&mut self, amount: usize) {
        self.bytes_written += amount as u64;
        self.writes_committed += 1;
    }

    pub(crate) fn record_read(&mut self, reader: usize, amount: usize) {
        self.bytes_read[reader] += amount as u64;
        self.reads_committed += 1;
    }

    pub(crate) fn record_rejection(&mut self) {
        self.rejected_commits += 1;
    }
}
