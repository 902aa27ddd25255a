//! Database statistics.

/// A point-in-time snapshot of one segment's state.
#[derive(Debug, Clone, Default)]
pub struct SegmentStats {
    /// Number of live keys in the in-memory index.
    pub live_keys: usize,
    /// Number of reusable (tombstoned or swept) slots in the free list.
    pub free_slots: usize,
    /// Logical size of the data file in bytes.
    pub file_size: u64,
    /// Highest WAL LSN reflected in the data file header.
    pub last_applied_lsn: u64,
    /// Current WAL file size in bytes, if the WAL is enabled.
    pub wal_size: Option<u64>,
}

/// Statistics across all segments of a database.
#[derive(Debug, Clone, Default)]
pub struct DbStats {
    /// Per-segment snapshots, in segment order.
    pub segments: Vec<SegmentStats>,
}

impl DbStats {
    /// Total live keys across all segments.
    #[must_use]
    pub fn live_keys(&self) -> usize {
        self.segments.iter().map(|s| s.live_keys).sum()
    }

    /// Total reusable slots across all segments.
    #[must_use]
    pub fn free_slots(&self) -> usize {
        self.segments.iter().map(|s| s.free_slots).sum()
    }

    /// Total data file bytes across all segments.
    #[must_use]
    pub fn file_size(&self) -> u64 {
        self.segments.iter().map(|s| s.file_size).sum()
    }
}
