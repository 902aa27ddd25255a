//! Shared helpers for SlotDB benchmarks.

use slotdb_core::{Config, Db};
use std::time::Duration;
use tempfile::TempDir;

/// Opens a single-segment database in a fresh temp directory, with
/// background loops disabled so only the measured operations run.
///
/// The `TempDir` must be kept alive for the database's lifetime.
pub fn open_temp_db(use_wal: bool) -> (TempDir, Db) {
    let dir = TempDir::new().expect("creating bench temp dir");

    let config = Config::new()
        .segment_count(1)
        .sync_period(Duration::ZERO)
        .sweep_period(Duration::ZERO)
        .use_wal(use_wal);

    let db = Db::open(dir.path(), config).expect("opening bench db");
    (dir, db)
}

/// Deterministic pseudo-random payload of the given size.
pub fn payload(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}
