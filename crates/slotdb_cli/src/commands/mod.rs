//! CLI command implementations.

pub mod dump_wal;
pub mod inspect;
pub mod verify;

use std::path::{Path, PathBuf};

/// Segment indices present in a data directory, discovered from the
/// `<N>_data.bin` naming convention, in ascending order.
pub fn discover_segments(path: &Path) -> Result<Vec<usize>, Box<dyn std::error::Error>> {
    if !path.is_dir() {
        return Err(format!("no data directory at {}", path.display()).into());
    }

    let mut segments = Vec::new();

    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };

        if let Some(index) = name.strip_suffix("_data.bin") {
            if let Ok(index) = index.parse::<usize>() {
                segments.push(index);
            }
        }
    }

    if segments.is_empty() {
        return Err(format!("no segment files found in {}", path.display()).into());
    }

    segments.sort_unstable();
    Ok(segments)
}

/// Path to one segment's data file.
pub fn data_path(path: &Path, segment: usize) -> PathBuf {
    path.join(format!("{segment}_data.bin"))
}

/// Path to one segment's WAL file.
pub fn wal_path(path: &Path, segment: usize) -> PathBuf {
    path.join(format!("{segment}_wal.bin"))
}
