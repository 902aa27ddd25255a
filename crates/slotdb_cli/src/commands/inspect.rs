//! Inspect command: per-segment statistics from the raw files.

use super::{data_path, discover_segments, wal_path};
use slotdb_core::segment::{blob, visit_slots, FILE_HEADER_SIZE};
use slotdb_storage::{FileBackend, StorageBackend};
use std::path::Path;

struct SegmentSummary {
    index: usize,
    file_size: u64,
    last_applied_lsn: u64,
    live: usize,
    deleted: usize,
    expired: usize,
    wal_size: Option<u64>,
}

/// Runs the inspect command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let segments = discover_segments(path)?;
    let now = now_secs();

    println!("data directory: {}", path.display());
    println!(
        "{:>7} {:>12} {:>10} {:>8} {:>8} {:>8} {:>10}",
        "segment", "size", "lsn", "live", "deleted", "expired", "wal"
    );

    let mut summaries = Vec::new();
    for index in segments {
        summaries.push(inspect_segment(path, index, now)?);
    }

    for s in &summaries {
        let wal = s
            .wal_size
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        println!(
            "{:>7} {:>12} {:>10} {:>8} {:>8} {:>8} {:>10}",
            s.index, s.file_size, s.last_applied_lsn, s.live, s.deleted, s.expired, wal
        );
    }

    let live: usize = summaries.iter().map(|s| s.live).sum();
    let size: u64 = summaries.iter().map(|s| s.file_size).sum();
    println!("total: {} live keys in {} bytes", live, size);

    Ok(())
}

fn inspect_segment(
    path: &Path,
    index: usize,
    now: u32,
) -> Result<SegmentSummary, Box<dyn std::error::Error>> {
    let file = FileBackend::open(&data_path(path, index))?;

    let mut summary = SegmentSummary {
        index,
        file_size: file.size()?,
        last_applied_lsn: 0,
        live: 0,
        deleted: 0,
        expired: 0,
        wal_size: None,
    };

    if summary.file_size >= FILE_HEADER_SIZE {
        let header = file.read_at(0, FILE_HEADER_SIZE as usize)?;
        summary.last_applied_lsn = u64::from_be_bytes(header[16..24].try_into()?);

        visit_slots(&file, |_, _, header| {
            if header.is_expired(now) {
                summary.expired += 1;
            } else if header.status == blob::STATUS_DELETED {
                summary.deleted += 1;
            } else {
                summary.live += 1;
            }
            Ok(())
        })?;
    }

    let wal = wal_path(path, index);
    if wal.exists() {
        summary.wal_size = Some(std::fs::metadata(&wal)?.len());
    }

    Ok(summary)
}

fn now_secs() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}
