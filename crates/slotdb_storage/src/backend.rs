//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level storage backend for SlotDB.
///
/// Storage backends are **opaque byte stores**. They provide positional
/// reads and writes, appends, and durability control. SlotDB owns all file
/// format interpretation - backends do not understand slots, blob headers,
/// or WAL entries.
///
/// # Invariants
///
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `write_at` never shrinks the storage; writing past the end extends it
/// - `append` returns the offset where data was written
/// - `sync` ensures all written data is durable
/// - Backends must be `Send + Sync` for concurrent access
///
/// Mutating operations take `&mut self`, so the caller's lock discipline
/// serializes writers; backends themselves need no interior locking.
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The read would extend beyond the current size (`ReadPastEnd`)
    /// - An I/O error occurs
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Writes `data` starting at `offset`.
    ///
    /// Existing bytes in the range are overwritten. Writing at or past the
    /// current end extends the storage.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> StorageResult<()>;

    /// Appends data to the end of the storage.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Returns the current size of the storage in bytes.
    ///
    /// This is the offset where the next `append` will write.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// After this returns successfully, all previously written data is
    /// guaranteed to survive process termination.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Truncates the storage to the given size and syncs.
    ///
    /// This removes all data after the specified offset. This is used for
    /// WAL truncation after a checkpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The truncation fails
    /// - `new_size` is greater than the current size
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;
}
