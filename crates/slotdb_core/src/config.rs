//! Database configuration.

use crate::error::{CoreError, CoreResult};
use std::time::Duration;

/// Configuration for opening a database.
///
/// Each segment runs its own background fsync/checkpoint loop and expired-key
/// sweep loop. The jitter fields add a random delta (drawn once per segment at
/// open) to the corresponding period so the segments do not all wake at the
/// same instant.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of independent segments the key space is sharded across.
    pub segment_count: usize,

    /// How often each segment fsyncs its data file and checkpoints its WAL.
    /// Zero disables the loop.
    pub sync_period: Duration,

    /// Maximum random delta added to `sync_period` per segment.
    pub sync_jitter_max: Duration,

    /// How often each segment evicts expired keys from its in-memory index.
    /// Zero disables the loop.
    pub sweep_period: Duration,

    /// Maximum random delta added to `sweep_period` per segment.
    pub sweep_jitter_max: Duration,

    /// Whether to write a WAL. With the WAL disabled, writes are only durable
    /// after the next periodic fsync.
    pub use_wal: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            segment_count: 4,
            sync_period: Duration::from_secs(60),
            sync_jitter_max: Duration::ZERO,
            sweep_period: Duration::from_secs(60),
            sweep_jitter_max: Duration::ZERO,
            use_wal: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of segments.
    #[must_use]
    pub const fn segment_count(mut self, count: usize) -> Self {
        self.segment_count = count;
        self
    }

    /// Sets the fsync/checkpoint period. Zero disables the loop.
    #[must_use]
    pub const fn sync_period(mut self, period: Duration) -> Self {
        self.sync_period = period;
        self
    }

    /// Sets the maximum random delta added to the sync period per segment.
    #[must_use]
    pub const fn sync_jitter_max(mut self, delta: Duration) -> Self {
        self.sync_jitter_max = delta;
        self
    }

    /// Sets the expired-key sweep period. Zero disables the loop.
    #[must_use]
    pub const fn sweep_period(mut self, period: Duration) -> Self {
        self.sweep_period = period;
        self
    }

    /// Sets the maximum random delta added to the sweep period per segment.
    #[must_use]
    pub const fn sweep_jitter_max(mut self, delta: Duration) -> Self {
        self.sweep_jitter_max = delta;
        self
    }

    /// Sets whether to write a WAL.
    #[must_use]
    pub const fn use_wal(mut self, use_wal: bool) -> Self {
        self.use_wal = use_wal;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSegmentsNum`] if `segment_count` is zero.
    pub fn validate(&self) -> CoreResult<()> {
        if self.segment_count == 0 {
            return Err(CoreError::InvalidSegmentsNum);
        }
        Ok(())
    }
}
