//! The per-segment storage engine.
//!
//! A segment owns one data file: a 24-byte header followed by a contiguous
//! run of power-of-two sized slots. Live keys are found through the in-memory
//! [`SlotIndex`]; deletion tombstones the status byte in place and recycles
//! the slot through the free list.
//!
//! ## Data file header
//!
//! ```text
//! | magic D4 D3 D4 (3) | layout version (1) | reserved (12) | last_applied_lsn (8 BE) |
//! ```
//!
//! `last_applied_lsn` is the highest WAL LSN whose effect is reflected in
//! this file. On open, WAL entries past it are replayed.
//!
//! ## Locking
//!
//! All state lives behind one `RwLock`: readers (`get`) share it, writers
//! (`set`, `delete`, fsync, sweep, close) take it exclusively. The WAL keeps
//! its own internal lock so its LSN counter can be inspected independently.
//! The poison flag sits beside the state lock so that a failed reader can
//! set it without upgrading to the exclusive lock.

use crate::error::{CoreError, CoreResult};
use crate::hash;
use crate::segment::blob::{self, Blob, BlobHeader};
use crate::segment::index::{SlotIndex, SlotMeta};
use crate::segment::tasks::{self, TaskHandle};
use crate::stats::SegmentStats;
use crate::types::{unix_now, KeyHash, Lsn};
use crate::wal::{WalAction, WalManager};
use parking_lot::{Mutex, RwLock};
use slotdb_storage::StorageBackend;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Size of the data file header in bytes.
pub const FILE_HEADER_SIZE: u64 = 24;

/// Magic numbers at the start of every data file.
pub const FILE_MAGIC: [u8; 3] = [212, 211, 212];

/// The only layout version this build reads and writes.
pub const LAYOUT_VERSION_1: u8 = 1;

/// Offset of the `last_applied_lsn` field within the file header.
const LAST_APPLIED_LSN_OFFSET: u64 = 16;

/// Per-segment options, already jittered by the caller.
#[derive(Debug, Clone, Default)]
pub struct SegmentOptions {
    /// Period of the fsync/checkpoint loop. Zero disables it.
    pub sync_period: Duration,
    /// Period of the expired-key sweep loop. Zero disables it.
    pub sweep_period: Duration,
}

/// One shard of the store: a data file, its in-memory index, and an optional
/// WAL, serving `set`/`get`/`delete` for the keys hashed to it.
pub struct Segment {
    inner: RwLock<SegmentInner>,
    wal: Option<WalManager>,
    tasks: Mutex<Option<TaskHandle>>,
    /// Set when an operation failed at a point where disk and memory may
    /// disagree. Lives outside the state lock so readers can set it too.
    poisoned: Mutex<Option<String>>,
}

struct SegmentInner {
    file: Box<dyn StorageBackend>,
    /// Logical end of the data file; the write position for appended slots.
    file_size: u64,
    index: SlotIndex,
    last_applied_lsn: Lsn,
    closed: bool,
}

impl Segment {
    /// Opens a segment over a data backend and an optional WAL backend.
    ///
    /// Recovery order: the data file is loaded (or initialized if empty),
    /// then WAL entries with `lsn > last_applied_lsn` are replayed, the new
    /// LSN is persisted, the data file is fsynced and the WAL truncated.
    /// Finally the background loops are started per `options`.
    ///
    /// # Errors
    ///
    /// Fails on an invalid data file (magic/version/status), a corrupt WAL,
    /// or any I/O error.
    pub fn open(
        data: Box<dyn StorageBackend>,
        wal: Option<Box<dyn StorageBackend>>,
        options: SegmentOptions,
    ) -> CoreResult<Arc<Self>> {
        let mut data = data;
        let (file_size, index, last_applied_lsn) = load_state(data.as_mut())?;

        let mut inner = SegmentInner {
            file: data,
            file_size,
            index,
            last_applied_lsn,
            closed: false,
        };

        debug!(
            live_keys = inner.index.live_len(),
            free_slots = inner.index.free_len(),
            lsn = inner.last_applied_lsn.as_u64(),
            "segment state loaded"
        );

        let wal = match wal {
            Some(backend) => {
                let (manager, pending) = WalManager::open(backend, last_applied_lsn)?;

                if !pending.is_empty() {
                    let replayed = pending.len();
                    inner.apply_pending(pending)?;

                    // A fresh checkpoint: the replayed actions are now in the
                    // data file, so the log can be dropped.
                    inner.file.sync()?;
                    manager.checkpoint()?;

                    debug!(
                        entries = replayed,
                        lsn = inner.last_applied_lsn.as_u64(),
                        "replayed write-ahead log"
                    );
                }

                Some(manager)
            }
            None => None,
        };

        let segment = Arc::new(Self {
            inner: RwLock::new(inner),
            wal,
            tasks: Mutex::new(None),
            poisoned: Mutex::new(None),
        });

        let handle = tasks::spawn_maintenance(&segment, options.sync_period, options.sweep_period);
        *segment.tasks.lock() = Some(handle);

        Ok(segment)
    }

    /// Sets `key` to `value`. Overwrites any live entry with the same key.
    ///
    /// `expire` is an absolute Unix-seconds expiry; 0 means never expires.
    /// The caller supplies the 32-bit key hash.
    ///
    /// # Errors
    ///
    /// Returns a storage error on I/O failure; the segment is poisoned in
    /// that case.
    pub fn set(&self, key_hash: KeyHash, key: &[u8], value: &[u8], expire: u32) -> CoreResult<()> {
        let mut inner = self.inner.write();
        self.check_usable(&inner)?;

        if let Some(wal) = &self.wal {
            let lsn = self.poison_on_fatal(wal.append_set(key, value, expire))?;
            self.poison_on_fatal(inner.write_last_applied(lsn))?;
        }

        self.poison_on_fatal(inner.raw_set(key_hash, key, value, expire))
    }

    /// Returns the current value of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the key is absent, deleted, or
    /// expired; a storage error on I/O failure, which also poisons the
    /// segment (the poison flag sits outside the state lock, so a reader
    /// can set it without giving up its shared lock).
    pub fn get(&self, key_hash: KeyHash, key: &[u8]) -> CoreResult<Vec<u8>> {
        let inner = self.inner.read();
        self.check_usable(&inner)?;
        self.poison_on_fatal(inner.raw_get(key_hash, key))
    }

    /// Marks `key` deleted.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no live entry exists; a storage
    /// error on I/O failure (poisoning the segment).
    pub fn delete(&self, key_hash: KeyHash, key: &[u8]) -> CoreResult<()> {
        let mut inner = self.inner.write();
        self.check_usable(&inner)?;

        // The DEL entry is logged before looking the key up; replaying a DEL
        // for a missing key is a no-op.
        if let Some(wal) = &self.wal {
            let lsn = self.poison_on_fatal(wal.append_del(key))?;
            self.poison_on_fatal(inner.write_last_applied(lsn))?;
        }

        self.poison_on_fatal(inner.raw_delete(key_hash, key))
    }

    /// Fsyncs the data file and, with a WAL present, truncates it.
    ///
    /// This is the checkpoint operation the background loop runs; it is also
    /// safe to call directly for an explicit durability point.
    ///
    /// # Errors
    ///
    /// Returns a storage error on I/O failure (poisoning the segment).
    pub fn fsync(&self) -> CoreResult<()> {
        let mut inner = self.inner.write();
        self.check_usable(&inner)?;
        self.poison_on_fatal(inner.raw_fsync(self.wal.as_ref()))
    }

    /// Evicts every expired entry from the in-memory index, releasing the
    /// slots for reuse. Returns the number of entries evicted.
    ///
    /// # Errors
    ///
    /// Fails only if the segment is closed or poisoned.
    pub fn sweep_expired(&self) -> CoreResult<usize> {
        let mut inner = self.inner.write();
        self.check_usable(&inner)?;
        Ok(inner.index.sweep_expired(unix_now()))
    }

    /// Stops the background loops, fsyncs, checkpoints, and marks the
    /// segment closed. Every later operation fails with [`CoreError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns a storage error if the final fsync fails.
    pub fn close(&self) -> CoreResult<()> {
        if let Some(handle) = self.tasks.lock().take() {
            handle.shutdown();
        }

        let mut inner = self.inner.write();
        if inner.closed {
            return Ok(());
        }

        self.poison_on_fatal(inner.raw_fsync(self.wal.as_ref()))?;
        inner.closed = true;
        Ok(())
    }

    /// A point-in-time snapshot of this segment's state.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the WAL size cannot be read.
    pub fn stats(&self) -> CoreResult<SegmentStats> {
        let inner = self.inner.read();

        let wal_size = match &self.wal {
            Some(wal) => Some(self.poison_on_fatal(wal.size())?),
            None => None,
        };

        Ok(SegmentStats {
            live_keys: inner.index.live_len(),
            free_slots: inner.index.free_len(),
            file_size: inner.file_size,
            last_applied_lsn: inner.last_applied_lsn.as_u64(),
            wal_size,
        })
    }

    /// The highest WAL LSN reflected in the data file.
    #[must_use]
    pub fn last_applied_lsn(&self) -> Lsn {
        self.inner.read().last_applied_lsn
    }

    /// The largest LSN ever assigned by this segment's WAL, if it has one.
    #[must_use]
    pub fn wal_last_lsn(&self) -> Option<Lsn> {
        self.wal.as_ref().map(WalManager::last_lsn)
    }

    fn check_usable(&self, inner: &SegmentInner) -> CoreResult<()> {
        if inner.closed {
            return Err(CoreError::Closed);
        }
        if let Some(message) = &*self.poisoned.lock() {
            return Err(CoreError::SegmentPoisoned {
                message: message.clone(),
            });
        }
        Ok(())
    }

    /// Records the failure if `result` is a fatal storage/I/O error, so every
    /// later operation refuses to run against possibly inconsistent state.
    /// The first fault wins; later ones keep the original message.
    fn poison_on_fatal<T>(&self, result: CoreResult<T>) -> CoreResult<T> {
        if let Err(err) = &result {
            if err.is_fatal() {
                let mut poisoned = self.poisoned.lock();
                if poisoned.is_none() {
                    *poisoned = Some(err.to_string());
                }
            }
        }
        result
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Segment")
            .field("file_size", &inner.file_size)
            .field("live_keys", &inner.index.live_len())
            .field("last_applied_lsn", &inner.last_applied_lsn)
            .field("closed", &inner.closed)
            .finish_non_exhaustive()
    }
}

impl SegmentInner {
    fn write_last_applied(&mut self, lsn: Lsn) -> CoreResult<()> {
        self.file
            .write_at(LAST_APPLIED_LSN_OFFSET, &lsn.as_u64().to_be_bytes())?;
        self.last_applied_lsn = lsn;
        Ok(())
    }

    /// Replays pending WAL actions in log order, then persists the new
    /// `last_applied_lsn`.
    fn apply_pending(&mut self, pending: Vec<WalAction>) -> CoreResult<()> {
        let mut last = self.last_applied_lsn;

        for action in pending {
            match action {
                WalAction::Set {
                    lsn,
                    key,
                    value,
                    expire,
                } => {
                    self.raw_set(hash::hash_key(&key), &key, &value, expire)?;
                    last = lsn;
                }
                WalAction::Del { lsn, key } => {
                    match self.raw_delete(hash::hash_key(&key), &key) {
                        // The DEL was logged before the key was looked up.
                        Err(CoreError::NotFound) | Ok(()) => {}
                        Err(err) => return Err(err),
                    }
                    last = lsn;
                }
            }
        }

        self.write_last_applied(last)
    }

    fn raw_set(&mut self, key_hash: KeyHash, key: &[u8], value: &[u8], expire: u32) -> CoreResult<()> {
        let now = unix_now();

        // Tombstone any live entry with the identical key. Expired entries
        // are skipped here; the sweep loop reclaims them.
        let candidates: Vec<SlotMeta> = self
            .index
            .bucket(key_hash)
            .map(<[SlotMeta]>::to_vec)
            .unwrap_or_default();

        for meta in candidates {
            if meta.is_expired(now) {
                continue;
            }

            let buf = self.file.read_at(meta.offset, meta.size as usize)?;
            let on_disk = Blob::unmarshal(&buf);

            if on_disk.key == key {
                self.file
                    .write_at(meta.offset + blob::STATUS_OFFSET, &[blob::STATUS_DELETED])?;
                self.index.evict(key_hash, meta);
                break;
            }
        }

        let new_blob = Blob {
            key: key.to_vec(),
            value: value.to_vec(),
            expire,
        };
        let (bytes, slot_size) = new_blob.marshal();

        // Prefer a recycled slot of exactly this size; otherwise append.
        let (offset, appended) = match self.index.claim_free(slot_size) {
            Some(offset) => (offset, false),
            None => (self.file_size, true),
        };

        self.file.write_at(offset, &bytes)?;
        if appended {
            self.file_size += u64::from(slot_size);
        }

        self.index.record_live(
            key_hash,
            SlotMeta {
                offset,
                size: slot_size,
                expire,
            },
        );

        Ok(())
    }

    fn raw_get(&self, key_hash: KeyHash, key: &[u8]) -> CoreResult<Vec<u8>> {
        let Some(bucket) = self.index.bucket(key_hash) else {
            return Err(CoreError::NotFound);
        };

        let now = unix_now();

        for meta in bucket {
            if meta.is_expired(now) {
                continue;
            }

            let buf = self.file.read_at(meta.offset, meta.size as usize)?;
            let on_disk = Blob::unmarshal(&buf);

            if on_disk.key == key {
                // Expiry may have elapsed between the meta check and the
                // read; pretend the key is already gone.
                if on_disk.is_expired(now) {
                    return Err(CoreError::NotFound);
                }
                return Ok(on_disk.value);
            }
        }

        Err(CoreError::NotFound)
    }

    fn raw_delete(&mut self, key_hash: KeyHash, key: &[u8]) -> CoreResult<()> {
        let now = unix_now();

        let candidates: Vec<SlotMeta> = self
            .index
            .bucket(key_hash)
            .map(<[SlotMeta]>::to_vec)
            .unwrap_or_default();

        for meta in candidates {
            if meta.is_expired(now) {
                continue;
            }

            let buf = self.file.read_at(meta.offset, meta.size as usize)?;
            let on_disk = Blob::unmarshal(&buf);

            if on_disk.key == key {
                self.file
                    .write_at(meta.offset + blob::STATUS_OFFSET, &[blob::STATUS_DELETED])?;
                self.index.evict(key_hash, meta);
                return Ok(());
            }
        }

        Err(CoreError::NotFound)
    }

    fn raw_fsync(&mut self, wal: Option<&WalManager>) -> CoreResult<()> {
        self.file.sync()?;

        if let Some(wal) = wal {
            wal.checkpoint()?;
        }

        Ok(())
    }
}

/// Walks every slot of a data file, calling `visitor` with the file, the
/// slot offset, and the parsed header.
///
/// Starting at [`FILE_HEADER_SIZE`], the 12-byte blob header is read, the
/// visitor invoked, and the offset advanced by `1 << size_power`. The visitor
/// reads any body bytes it needs itself. Returns the offset one past the last
/// slot, which equals the logical file size.
///
/// # Errors
///
/// Propagates visitor errors and I/O failures.
pub fn visit_slots<F>(file: &dyn StorageBackend, mut visitor: F) -> CoreResult<u64>
where
    F: FnMut(&dyn StorageBackend, u64, &BlobHeader) -> CoreResult<()>,
{
    let mut offset = FILE_HEADER_SIZE;

    loop {
        let header_bytes = match file.read_at(offset, blob::HEADER_SIZE) {
            Ok(bytes) => bytes,
            Err(err) if err.is_read_past_end() => break,
            Err(err) => return Err(err.into()),
        };

        let mut fixed = [0u8; blob::HEADER_SIZE];
        fixed.copy_from_slice(&header_bytes);
        let header = BlobHeader::from_bytes(&fixed);

        visitor(file, offset, &header)?;

        offset += u64::from(header.slot_size());
    }

    Ok(offset)
}

/// Loads a segment's in-memory state from its data file.
///
/// An empty file gets a fresh header written. A non-empty file must start
/// with the magic numbers and a known layout version; every slot is visited
/// to rebuild the index: tombstoned and expired slots go to the free list,
/// live ones to their hash bucket.
fn load_state(file: &mut dyn StorageBackend) -> CoreResult<(u64, SlotIndex, Lsn)> {
    let size = file.size()?;

    if size == 0 {
        let mut header = [0u8; FILE_HEADER_SIZE as usize];
        header[..3].copy_from_slice(&FILE_MAGIC);
        header[3] = LAYOUT_VERSION_1;
        // reserved bytes and last_applied_lsn stay zero
        file.write_at(0, &header)?;

        return Ok((FILE_HEADER_SIZE, SlotIndex::new(), Lsn::ZERO));
    }

    if size < FILE_HEADER_SIZE {
        return Err(CoreError::SegmentMagicMismatch);
    }

    let header = file.read_at(0, FILE_HEADER_SIZE as usize)?;

    if header[..3] != FILE_MAGIC {
        return Err(CoreError::SegmentMagicMismatch);
    }

    let version = header[3];
    if version != LAYOUT_VERSION_1 {
        return Err(CoreError::UnknownSegmentVersion { version });
    }

    let last_applied = Lsn::new(u64::from_be_bytes(
        header[16..24].try_into().expect("header read is 24 bytes"),
    ));

    let now = unix_now();
    let mut index = SlotIndex::new();

    let file_size = visit_slots(file, |file, offset, header| {
        // An expired blob is treated as deleted regardless of its status
        // byte; on disk it stays as-is until the slot is overwritten.
        if header.is_expired(now) || header.status == blob::STATUS_DELETED {
            index.push_free(header.slot_size(), offset);
            return Ok(());
        }

        if header.status != blob::STATUS_OK {
            return Err(CoreError::UnknownBlobStatus {
                status: header.status,
                offset,
            });
        }

        let body_size = header.slot_size() as usize - blob::HEADER_SIZE;
        let body = file.read_at(offset + blob::HEADER_SIZE as u64, body_size)?;
        let item = Blob::unmarshal_body(&body, header);

        index.record_live(
            hash::hash_key(&item.key),
            SlotMeta {
                offset,
                size: header.slot_size(),
                expire: header.expire,
            },
        );

        Ok(())
    })?;

    Ok((file_size, index, last_applied))
}
