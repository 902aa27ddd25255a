//! Write-Ahead Log (WAL) for durability and crash recovery.
//!
//! Every mutation on a WAL-enabled segment is appended here, synchronously
//! flushed, before it touches the data file. On open, entries whose LSN
//! exceeds the segment's persisted checkpoint are replayed. After the data
//! file is fsynced, the log is truncated (a new checkpoint).
//!
//! ## Recovery Policy
//!
//! - End of file at an entry boundary ends replay normally.
//! - A truncated entry or unknown action type is fatal: the open fails
//!   rather than silently dropping tail entries.

mod manager;
mod record;

pub use manager::WalManager;
pub use record::{read_pending, WalAction, ACTION_DEL, ACTION_SET};
