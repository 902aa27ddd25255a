//! Dump-wal command: decode and print WAL entries.

use super::{discover_segments, wal_path};
use slotdb_core::wal::{read_pending, WalAction};
use slotdb_core::Lsn;
use slotdb_storage::FileBackend;
use std::path::Path;

/// Runs the dump-wal command for one segment or all of them.
pub fn run(path: &Path, segment: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let segments = match segment {
        Some(index) => vec![index],
        None => discover_segments(path)?,
    };

    for index in segments {
        dump_segment_wal(path, index)?;
    }

    Ok(())
}

fn dump_segment_wal(path: &Path, index: usize) -> Result<(), Box<dyn std::error::Error>> {
    let wal_file = wal_path(path, index);

    if !wal_file.exists() {
        println!("segment {index}: no WAL file");
        return Ok(());
    }

    let backend = FileBackend::open(&wal_file)?;
    let (actions, last_seen) = read_pending(&backend, Lsn::ZERO)?;

    println!("segment {index}: {} entries, last lsn {}", actions.len(), last_seen);

    for action in actions {
        match action {
            WalAction::Set {
                lsn,
                key,
                value,
                expire,
            } => {
                println!(
                    "  {lsn} SET key={:?} value_len={} expire={expire}",
                    String::from_utf8_lossy(&key),
                    value.len()
                );
            }
            WalAction::Del { lsn, key } => {
                println!("  {lsn} DEL key={:?}", String::from_utf8_lossy(&key));
            }
        }
    }

    Ok(())
}
