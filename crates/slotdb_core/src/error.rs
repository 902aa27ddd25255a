//! Error types for SlotDB core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in SlotDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The key does not exist, was deleted, or has expired.
    #[error("key not found")]
    NotFound,

    /// The data directory path is invalid.
    #[error("invalid path for storing data")]
    InvalidPath,

    /// The configured number of segments is invalid.
    #[error("invalid number of segments")]
    InvalidSegmentsNum,

    /// A segment file does not start with the expected magic numbers.
    #[error("segment file magic numbers do not match")]
    SegmentMagicMismatch,

    /// A segment file carries a layout version this build does not understand.
    #[error("unknown segment file layout version {version}")]
    UnknownSegmentVersion {
        /// The version byte found in the file header.
        version: u8,
    },

    /// A slot header carries a status byte that is neither OK nor DELETED.
    #[error("unknown blob status {status} at offset {offset}")]
    UnknownBlobStatus {
        /// The status byte found on disk.
        status: u8,
        /// The slot offset where it was found.
        offset: u64,
    },

    /// The WAL is corrupted or invalid.
    #[error("WAL corruption: {message}")]
    WalCorruption {
        /// Description of the corruption.
        message: String,
    },

    /// A previous operation on this segment failed at a point where the
    /// on-disk and in-memory state may disagree. All further operations are
    /// refused with this error.
    #[error("segment poisoned by earlier failure: {message}")]
    SegmentPoisoned {
        /// The failure that poisoned the segment.
        message: String,
    },

    /// The segment has been closed.
    #[error("segment is closed")]
    Closed,

    /// The database directory is locked by another process.
    #[error("database locked: another process has exclusive access")]
    DatabaseLocked,

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] slotdb_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CoreError {
    /// Creates a WAL corruption error.
    pub fn wal_corruption(message: impl Into<String>) -> Self {
        Self::WalCorruption {
            message: message.into(),
        }
    }

    /// Returns true if this error invalidates the segment state when it
    /// occurs mid-write (storage and I/O faults, not logical outcomes like
    /// [`CoreError::NotFound`]).
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io(_))
    }
}
