//! WAL manager: LSN assignment, synchronous appends, checkpointing.

use crate::error::CoreResult;
use crate::types::Lsn;
use crate::wal::record::{self, WalAction};
use parking_lot::Mutex;
use slotdb_storage::StorageBackend;

/// Manages one segment's write-ahead log.
///
/// The manager owns the WAL backend and the `last_lsn` counter behind its own
/// lock, independent of the segment lock. The segment holds its exclusive
/// lock across `append_*` calls to preserve ordering; the WAL's internal lock
/// protects the counter and the file append, and lets [`WalManager::last_lsn`]
/// be read at any time.
///
/// # Durability
///
/// The backend is synced after every append. When `append_set` or
/// `append_del` returns, a crash and reopen of the segment will observe the
/// entry.
pub struct WalManager {
    inner: Mutex<WalInner>,
}

struct WalInner {
    backend: Box<dyn StorageBackend>,
    last_lsn: Lsn,
}

impl WalManager {
    /// Opens the WAL and returns the actions not yet applied to the segment.
    ///
    /// The whole log is scanned: entries with `lsn > last_applied` are
    /// materialized and returned in log order; earlier entries are skipped
    /// without reading their payloads. The internal LSN counter resumes from
    /// the largest LSN seen (or from `last_applied` if the log is empty).
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::WalCorruption`] for a truncated or
    /// malformed log, or a storage error for I/O failures.
    pub fn open(
        backend: Box<dyn StorageBackend>,
        last_applied: Lsn,
    ) -> CoreResult<(Self, Vec<WalAction>)> {
        let (pending, last_seen) = record::read_pending(backend.as_ref(), last_applied)?;

        let manager = Self {
            inner: Mutex::new(WalInner {
                backend,
                last_lsn: last_seen,
            }),
        };

        Ok((manager, pending))
    }

    /// Appends a SET entry and returns its LSN.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the append or sync fails; in that case no
    /// LSN is consumed.
    pub fn append_set(&self, key: &[u8], value: &[u8], expire: u32) -> CoreResult<Lsn> {
        let mut inner = self.inner.lock();
        let lsn = inner.last_lsn.next();

        let action = WalAction::Set {
            lsn,
            key: key.to_vec(),
            value: value.to_vec(),
            expire,
        };
        inner.append(&action)?;

        Ok(lsn)
    }

    /// Appends a DEL entry and returns its LSN.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the append or sync fails; in that case no
    /// LSN is consumed.
    pub fn append_del(&self, key: &[u8]) -> CoreResult<Lsn> {
        let mut inner = self.inner.lock();
        let lsn = inner.last_lsn.next();

        let action = WalAction::Del {
            lsn,
            key: key.to_vec(),
        };
        inner.append(&action)?;

        Ok(lsn)
    }

    /// The largest LSN ever assigned by this WAL.
    #[must_use]
    pub fn last_lsn(&self) -> Lsn {
        self.inner.lock().last_lsn
    }

    /// Truncates the log to zero length and syncs it.
    ///
    /// Must only be called after the segment's data file has been synced;
    /// otherwise actions could be lost on a crash. The LSN counter is not
    /// reset - LSNs keep increasing across checkpoints.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the truncation fails.
    pub fn checkpoint(&self) -> CoreResult<()> {
        let mut inner = self.inner.lock();
        inner.backend.truncate(0)?;
        Ok(())
    }

    /// Current size of the WAL file in bytes.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the size cannot be determined.
    pub fn size(&self) -> CoreResult<u64> {
        Ok(self.inner.lock().backend.size()?)
    }
}

impl WalInner {
    fn append(&mut self, action: &WalAction) -> CoreResult<()> {
        self.backend.append(&action.encode())?;
        self.backend.sync()?;
        self.last_lsn = action.lsn();
        Ok(())
    }
}

impl std::fmt::Debug for WalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalManager")
            .field("last_lsn", &self.last_lsn())
            .finish_non_exhaustive()
    }
}
