//! Shared helpers for integration tests: raw segment and WAL file builders.
#![allow(dead_code)]

use slotdb_core::segment::blob::Blob;
use slotdb_core::segment::{FILE_MAGIC, LAYOUT_VERSION_1};
use slotdb_core::wal::WalAction;
use slotdb_core::Lsn;
use std::path::Path;

/// Builds the raw bytes of a segment data file: header with `last_lsn`
/// followed by one live blob per entry, in order.
pub fn segment_bytes(entries: &[(&[u8], &[u8], u32)], last_lsn: u64) -> Vec<u8> {
    let mut buf = Vec::new();

    buf.extend_from_slice(&FILE_MAGIC);
    buf.push(LAYOUT_VERSION_1);
    buf.extend_from_slice(&[0u8; 12]);
    buf.extend_from_slice(&last_lsn.to_be_bytes());

    for (key, value, expire) in entries {
        let blob = Blob {
            key: key.to_vec(),
            value: value.to_vec(),
            expire: *expire,
        };
        let (bytes, _) = blob.marshal();
        buf.extend_from_slice(&bytes);
    }

    buf
}

/// Builds the raw bytes of a WAL file from encoded actions.
pub fn wal_bytes(actions: &[WalAction]) -> Vec<u8> {
    let mut buf = Vec::new();
    for action in actions {
        buf.extend_from_slice(&action.encode());
    }
    buf
}

pub fn set_action(lsn: u64, key: &[u8], value: &[u8]) -> WalAction {
    WalAction::Set {
        lsn: Lsn::new(lsn),
        key: key.to_vec(),
        value: value.to_vec(),
        expire: 0,
    }
}

pub fn set_action_expiring(lsn: u64, key: &[u8], value: &[u8], expire: u32) -> WalAction {
    WalAction::Set {
        lsn: Lsn::new(lsn),
        key: key.to_vec(),
        value: value.to_vec(),
        expire,
    }
}

pub fn del_action(lsn: u64, key: &[u8]) -> WalAction {
    WalAction::Del {
        lsn: Lsn::new(lsn),
        key: key.to_vec(),
    }
}

pub fn write_file(path: &Path, bytes: &[u8]) {
    std::fs::write(path, bytes).expect("writing test fixture");
}

/// Current Unix seconds, for expiry fixtures.
pub fn now_secs() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs() as u32
}
