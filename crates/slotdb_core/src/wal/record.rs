//! WAL entry model and byte codec.
//!
//! Entries are variable-length and self-delimiting:
//!
//! ```text
//! SET: | lsn (8 BE) | 1 | expire (4 BE) | key_len (2 BE) | val_len (4 BE) | key | value |
//! DEL: | lsn (8 BE) | 2 | key_len (2 BE) | key |
//! ```
//!
//! LSNs within one WAL are strictly increasing.
//!
//! ## Replay policy
//!
//! [`read_pending`] distinguishes a clean end of log from corruption:
//!
//! - End of file exactly at an entry boundary ends replay normally.
//! - A truncated entry (header or payload cut short) is fatal
//!   [`CoreError::WalCorruption`] - recovery refuses to silently discard
//!   tail entries.
//! - An unknown action type byte is fatal [`CoreError::WalCorruption`].

use crate::error::{CoreError, CoreResult};
use crate::types::Lsn;
use slotdb_storage::StorageBackend;

/// Action type byte for a SET entry.
pub const ACTION_SET: u8 = 1;

/// Action type byte for a DEL entry.
pub const ACTION_DEL: u8 = 2;

/// lsn (8) + type (1)
const ENTRY_PREFIX_SIZE: u64 = 9;

/// expire (4) + key_len (2) + val_len (4)
const SET_FIXED_SIZE: u64 = 10;

/// key_len (2)
const DEL_FIXED_SIZE: u64 = 2;

/// One logical action recorded in the WAL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalAction {
    /// Set a key to a value, with an optional absolute expiry.
    Set {
        /// LSN assigned to this entry.
        lsn: Lsn,
        /// Raw key bytes.
        key: Vec<u8>,
        /// Raw value bytes.
        value: Vec<u8>,
        /// Absolute expiry as Unix seconds; 0 means no expiry.
        expire: u32,
    },
    /// Delete a key. Replaying a DEL for a missing key is a no-op.
    Del {
        /// LSN assigned to this entry.
        lsn: Lsn,
        /// Raw key bytes.
        key: Vec<u8>,
    },
}

impl WalAction {
    /// The LSN stamped on this entry.
    #[must_use]
    pub fn lsn(&self) -> Lsn {
        match self {
            Self::Set { lsn, .. } | Self::Del { lsn, .. } => *lsn,
        }
    }

    /// Encodes the entry to its on-disk form.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Set {
                lsn,
                key,
                value,
                expire,
            } => {
                let mut buf =
                    Vec::with_capacity((ENTRY_PREFIX_SIZE + SET_FIXED_SIZE) as usize + key.len() + value.len());
                buf.extend_from_slice(&lsn.as_u64().to_be_bytes());
                buf.push(ACTION_SET);
                buf.extend_from_slice(&expire.to_be_bytes());
                buf.extend_from_slice(&(key.len() as u16).to_be_bytes());
                buf.extend_from_slice(&(value.len() as u32).to_be_bytes());
                buf.extend_from_slice(key);
                buf.extend_from_slice(value);
                buf
            }
            Self::Del { lsn, key } => {
                let mut buf =
                    Vec::with_capacity((ENTRY_PREFIX_SIZE + DEL_FIXED_SIZE) as usize + key.len());
                buf.extend_from_slice(&lsn.as_u64().to_be_bytes());
                buf.push(ACTION_DEL);
                buf.extend_from_slice(&(key.len() as u16).to_be_bytes());
                buf.extend_from_slice(key);
                buf
            }
        }
    }
}

/// Reads every WAL entry, materializing those with `lsn > last_applied`.
///
/// Entries at or below `last_applied` are skipped by advancing past their
/// payload without reading it. Returns the pending actions in log order and
/// the largest LSN seen in the file (`last_applied` if the file is empty).
///
/// # Errors
///
/// Returns [`CoreError::WalCorruption`] for a truncated entry or an unknown
/// action type, or a storage error for I/O failures.
pub fn read_pending(
    backend: &dyn StorageBackend,
    last_applied: Lsn,
) -> CoreResult<(Vec<WalAction>, Lsn)> {
    let size = backend.size()?;
    let mut offset = 0u64;
    let mut last_seen = last_applied;
    let mut pending = Vec::new();

    while offset < size {
        if offset + ENTRY_PREFIX_SIZE > size {
            return Err(CoreError::wal_corruption(format!(
                "truncated entry prefix at offset {offset}"
            )));
        }

        let prefix = backend.read_at(offset, ENTRY_PREFIX_SIZE as usize)?;
        let lsn = Lsn::new(u64::from_be_bytes(
            prefix[..8].try_into().expect("prefix read is 9 bytes"),
        ));
        let action_type = prefix[8];
        offset += ENTRY_PREFIX_SIZE;

        last_seen = last_seen.max(lsn);

        match action_type {
            ACTION_SET => {
                if offset + SET_FIXED_SIZE > size {
                    return Err(CoreError::wal_corruption(format!(
                        "truncated SET entry {lsn} at offset {offset}"
                    )));
                }

                let fixed = backend.read_at(offset, SET_FIXED_SIZE as usize)?;
                let expire = u32::from_be_bytes([fixed[0], fixed[1], fixed[2], fixed[3]]);
                let key_len = u16::from_be_bytes([fixed[4], fixed[5]]) as u64;
                let val_len =
                    u32::from_be_bytes([fixed[6], fixed[7], fixed[8], fixed[9]]) as u64;
                offset += SET_FIXED_SIZE;

                if offset + key_len + val_len > size {
                    return Err(CoreError::wal_corruption(format!(
                        "truncated SET payload for entry {lsn} at offset {offset}"
                    )));
                }

                if lsn > last_applied {
                    let payload = backend.read_at(offset, (key_len + val_len) as usize)?;
                    let (key, value) = payload.split_at(key_len as usize);

                    pending.push(WalAction::Set {
                        lsn,
                        key: key.to_vec(),
                        value: value.to_vec(),
                        expire,
                    });
                }
                offset += key_len + val_len;
            }
            ACTION_DEL => {
                if offset + DEL_FIXED_SIZE > size {
                    return Err(CoreError::wal_corruption(format!(
                        "truncated DEL entry {lsn} at offset {offset}"
                    )));
                }

                let fixed = backend.read_at(offset, DEL_FIXED_SIZE as usize)?;
                let key_len = u16::from_be_bytes([fixed[0], fixed[1]]) as u64;
                offset += DEL_FIXED_SIZE;

                if offset + key_len > size {
                    return Err(CoreError::wal_corruption(format!(
                        "truncated DEL payload for entry {lsn} at offset {offset}"
                    )));
                }

                if lsn > last_applied {
                    let key = backend.read_at(offset, key_len as usize)?;
                    pending.push(WalAction::Del { lsn, key });
                }
                offset += key_len;
            }
            other => {
                return Err(CoreError::wal_corruption(format!(
                    "unknown action type {other} at offset {offset}"
                )));
            }
        }
    }

    Ok((pending, last_seen))
}
