//! Key hashing and shard dispatch.
//!
//! Keys are hashed with 32-bit murmur3 (seed 0). The same hash value selects
//! the segment (`hash % segment_count`) and the bucket within that segment,
//! so the on-disk layout is portable across tools that agree on the hash.

use crate::types::KeyHash;
use std::io::Cursor;

/// Hashes key bytes with murmur3 32-bit, seed 0.
#[must_use]
pub fn hash_key(key: &[u8]) -> KeyHash {
    murmur3::murmur3_32(&mut Cursor::new(key), 0).expect("reading from an in-memory cursor")
}

/// Maps a key hash to a segment index.
#[must_use]
pub fn segment_index(hash: KeyHash, segment_count: usize) -> usize {
    (hash % segment_count as u32) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash_key(b"key1"), hash_key(b"key1"));
        assert_ne!(hash_key(b"key1"), hash_key(b"key2"));
    }

    #[test]
    fn known_murmur3_vectors() {
        // Reference values for murmur3_32 with seed 0.
        assert_eq!(hash_key(b""), 0);
        assert_eq!(hash_key(b"hello"), 0x248b_fa47);
        assert_eq!(hash_key(b"hello, world"), 0x149b_bb7f);
    }

    #[test]
    fn segment_index_is_modulo() {
        for count in 1..8usize {
            for h in [0u32, 1, 7, 1000, u32::MAX] {
                assert_eq!(segment_index(h, count), (h as usize) % count);
            }
        }
    }
}
