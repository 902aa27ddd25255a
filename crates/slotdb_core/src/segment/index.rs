//! In-memory slot index and free-slot pool.
//!
//! A segment tracks two mappings, both guarded by the segment lock:
//!
//! - `hash -> [SlotMeta]`: one bucket per 32-bit key hash. A bucket holds one
//!   entry per distinct live key; hash collisions produce multiple entries,
//!   disambiguated by reading the key back from disk.
//! - `slot_size -> [offset]`: tombstoned or expired slots ready for reuse,
//!   keyed by exact slot size.
//!
//! Invariant: every slot offset appears in exactly one of the two mappings,
//! never both and never twice.

use crate::types::KeyHash;
use std::collections::HashMap;

/// In-memory metadata for one live slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotMeta {
    /// Offset of the slot in the data file.
    pub offset: u64,
    /// Slot size in bytes (a power of two).
    pub size: u32,
    /// Absolute expiry as Unix seconds; 0 means no expiry.
    pub expire: u32,
}

impl SlotMeta {
    /// Whether the entry is expired at `now` (Unix seconds).
    #[must_use]
    pub fn is_expired(&self, now: u32) -> bool {
        self.expire != 0 && self.expire <= now
    }
}

/// The per-segment slot index: hash buckets plus the free-slot pool.
#[derive(Debug, Default)]
pub struct SlotIndex {
    buckets: HashMap<KeyHash, Vec<SlotMeta>>,
    free: HashMap<u32, Vec<u64>>,
}

impl SlotIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a live entry to the bucket for `hash`.
    pub fn record_live(&mut self, hash: KeyHash, meta: SlotMeta) {
        self.buckets.entry(hash).or_default().push(meta);
    }

    /// Returns the bucket for `hash`, if any.
    #[must_use]
    pub fn bucket(&self, hash: KeyHash) -> Option<&[SlotMeta]> {
        self.buckets.get(&hash).map(Vec::as_slice)
    }

    /// Removes the bucket entry matching `meta`'s offset and size, releasing
    /// its offset to the free list. Returns true if an entry was removed.
    ///
    /// Bucket order is not observable, so removal is by swap.
    pub fn evict(&mut self, hash: KeyHash, meta: SlotMeta) -> bool {
        let Some(bucket) = self.buckets.get_mut(&hash) else {
            return false;
        };

        let Some(idx) = bucket
            .iter()
            .position(|m| m.offset == meta.offset && m.size == meta.size)
        else {
            return false;
        };

        bucket.swap_remove(idx);
        if bucket.is_empty() {
            self.buckets.remove(&hash);
        }

        self.free.entry(meta.size).or_default().push(meta.offset);
        true
    }

    /// Pops a reusable slot offset of exactly `size` bytes, if one exists.
    pub fn claim_free(&mut self, size: u32) -> Option<u64> {
        let offsets = self.free.get_mut(&size)?;
        let offset = offsets.pop();
        if offsets.is_empty() {
            self.free.remove(&size);
        }
        offset
    }

    /// Registers a slot known to be free (tombstoned or expired on disk)
    /// without it ever having been in a bucket. Used while loading the file.
    pub fn push_free(&mut self, size: u32, offset: u64) {
        self.free.entry(size).or_default().push(offset);
    }

    /// Evicts every expired bucket entry, moving its offset to the free list.
    /// Returns the number of entries evicted.
    pub fn sweep_expired(&mut self, now: u32) -> usize {
        let mut swept = 0;
        let Self { buckets, free } = self;

        buckets.retain(|_, bucket| {
            let mut i = 0;
            while i < bucket.len() {
                if bucket[i].is_expired(now) {
                    let meta = bucket.swap_remove(i);
                    free.entry(meta.size).or_default().push(meta.offset);
                    swept += 1;
                } else {
                    i += 1;
                }
            }
            !bucket.is_empty()
        });

        swept
    }

    /// Number of live entries across all buckets.
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Number of reusable slots in the free list.
    #[must_use]
    pub fn free_len(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(offset: u64, size: u32) -> SlotMeta {
        SlotMeta {
            offset,
            size,
            expire: 0,
        }
    }

    #[test]
    fn record_and_lookup() {
        let mut index = SlotIndex::new();
        index.record_live(7, meta(24, 32));

        let bucket = index.bucket(7).unwrap();
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket[0].offset, 24);
        assert!(index.bucket(8).is_none());
    }

    #[test]
    fn evict_moves_offset_to_free_list() {
        let mut index = SlotIndex::new();
        index.record_live(7, meta(24, 32));

        assert!(index.evict(7, meta(24, 32)));
        assert!(index.bucket(7).is_none());
        assert_eq!(index.claim_free(32), Some(24));
        assert_eq!(index.claim_free(32), None);
    }

    #[test]
    fn evict_unknown_entry_is_noop() {
        let mut index = SlotIndex::new();
        index.record_live(7, meta(24, 32));

        assert!(!index.evict(7, meta(56, 32)));
        assert!(!index.evict(9, meta(24, 32)));
        assert_eq!(index.live_len(), 1);
        assert_eq!(index.free_len(), 0);
    }

    #[test]
    fn collisions_share_a_bucket() {
        let mut index = SlotIndex::new();
        index.record_live(7, meta(24, 32));
        index.record_live(7, meta(56, 64));

        assert_eq!(index.bucket(7).unwrap().len(), 2);

        assert!(index.evict(7, meta(24, 32)));
        let bucket = index.bucket(7).unwrap();
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket[0].offset, 56);
    }

    #[test]
    fn claim_free_is_size_exact() {
        let mut index = SlotIndex::new();
        index.push_free(32, 24);

        assert_eq!(index.claim_free(16), None);
        assert_eq!(index.claim_free(64), None);
        assert_eq!(index.claim_free(32), Some(24));
    }

    #[test]
    fn sweep_evicts_only_expired() {
        let mut index = SlotIndex::new();
        index.record_live(
            1,
            SlotMeta {
                offset: 24,
                size: 32,
                expire: 100,
            },
        );
        index.record_live(
            1,
            SlotMeta {
                offset: 56,
                size: 32,
                expire: 0,
            },
        );
        index.record_live(
            2,
            SlotMeta {
                offset: 88,
                size: 16,
                expire: 200,
            },
        );

        let swept = index.sweep_expired(150);
        assert_eq!(swept, 1);
        assert_eq!(index.live_len(), 2);
        assert_eq!(index.claim_free(32), Some(24));
        assert_eq!(index.claim_free(16), None);
    }

    #[test]
    fn offsets_never_appear_twice() {
        let mut index = SlotIndex::new();
        index.record_live(1, meta(24, 32));
        index.record_live(1, meta(56, 32));
        index.record_live(2, meta(88, 32));

        index.evict(1, meta(24, 32));
        index.evict(2, meta(88, 32));

        let mut freed = vec![
            index.claim_free(32).unwrap(),
            index.claim_free(32).unwrap(),
        ];
        freed.sort_unstable();

        assert_eq!(freed, vec![24, 88]);
        assert_eq!(index.claim_free(32), None);
        assert_eq!(index.live_len(), 1);
    }
}
