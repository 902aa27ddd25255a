//! Data directory management.
//!
//! This module handles the file system layout for SlotDB:
//!
//! ```text
//! <data_path>/
//! ├─ LOCK          # Advisory lock for single-process access
//! ├─ 0_data.bin    # Segment 0 data file
//! ├─ 0_wal.bin     # Segment 0 WAL (only when the WAL is enabled)
//! ├─ 1_data.bin
//! ├─ 1_wal.bin
//! └─ ...
//! ```
//!
//! The LOCK file ensures only one process operates on the directory at a time.

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";

/// Manages the data directory structure and file locking.
///
/// The `DataDir` holds an exclusive advisory lock on the directory. Only one
/// `DataDir` instance can exist per directory at a time; the lock is released
/// when the instance is dropped.
#[derive(Debug)]
pub struct DataDir {
    /// Root directory path.
    path: PathBuf,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl DataDir {
    /// Opens or creates a data directory.
    ///
    /// A missing directory is created with mode 0755.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `path` is empty (`InvalidPath`)
    /// - Another process holds the lock (`DatabaseLocked`)
    /// - I/O errors occur
    pub fn open(path: &Path) -> CoreResult<Self> {
        if path.as_os_str().is_empty() {
            return Err(CoreError::InvalidPath);
        }

        if !path.exists() {
            create_dir_0755(path)?;
        }

        if !path.is_dir() {
            return Err(CoreError::InvalidPath);
        }

        let lock_path = path.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::DatabaseLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the path to the data directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to a segment's data file.
    #[must_use]
    pub fn data_path(&self, segment: usize) -> PathBuf {
        self.path.join(format!("{segment}_data.bin"))
    }

    /// Returns the path to a segment's WAL file.
    #[must_use]
    pub fn wal_path(&self, segment: usize) -> PathBuf {
        self.path.join(format!("{segment}_wal.bin"))
    }
}

#[cfg(unix)]
fn create_dir_0755(path: &Path) -> CoreResult<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(path)?;
    Ok(())
}

#[cfg(not(unix))]
fn create_dir_0755(path: &Path) -> CoreResult<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}
