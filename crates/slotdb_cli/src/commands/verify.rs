//! Verify command: structural integrity of every segment data file.
//!
//! Checks, per segment:
//! - the 24-byte header (magic numbers and layout version)
//! - that the slot walk partitions the file exactly
//! - that every slot's status byte is OK or DELETED
//! - that slot sizes are consistent with their declared payload lengths

use super::{data_path, discover_segments};
use slotdb_core::segment::{blob, visit_slots, FILE_HEADER_SIZE, FILE_MAGIC, LAYOUT_VERSION_1};
use slotdb_storage::{FileBackend, StorageBackend};
use std::path::Path;
use tracing::info;

/// Runs the verify command. Fails on the first corrupt segment.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let segments = discover_segments(path)?;
    let mut total_slots = 0usize;

    for index in segments {
        total_slots += verify_segment(path, index)?;
    }

    println!("ok: {total_slots} slots verified");
    Ok(())
}

fn verify_segment(path: &Path, index: usize) -> Result<usize, Box<dyn std::error::Error>> {
    let file_path = data_path(path, index);
    let file = FileBackend::open(&file_path)?;
    let size = file.size()?;

    if size < FILE_HEADER_SIZE {
        return Err(format!(
            "segment {index}: file is {size} bytes, smaller than the {FILE_HEADER_SIZE}-byte header"
        )
        .into());
    }

    let header = file.read_at(0, FILE_HEADER_SIZE as usize)?;
    if header[..3] != FILE_MAGIC {
        return Err(format!("segment {index}: magic numbers do not match").into());
    }
    if header[3] != LAYOUT_VERSION_1 {
        return Err(format!("segment {index}: unknown layout version {}", header[3]).into());
    }

    let mut slots = 0usize;
    let mut problem: Option<String> = None;

    let end = visit_slots(&file, |_, offset, header| {
        if header.status != blob::STATUS_OK && header.status != blob::STATUS_DELETED {
            return Err(slotdb_core::CoreError::UnknownBlobStatus {
                status: header.status,
                offset,
            });
        }

        let payload = blob::HEADER_SIZE as u32 + u32::from(header.key_len) + header.val_len;
        if payload > header.slot_size() && problem.is_none() {
            problem = Some(format!(
                "segment {index}: slot at offset {offset} declares {payload} payload bytes in a {}-byte slot",
                header.slot_size()
            ));
        }

        slots += 1;
        Ok(())
    })?;

    if let Some(problem) = problem {
        return Err(problem.into());
    }

    if end != size {
        return Err(format!(
            "segment {index}: slot walk ended at {end} but the file is {size} bytes"
        )
        .into());
    }

    info!(segment = index, slots, "segment verified");
    Ok(slots)
}
