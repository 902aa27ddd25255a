//! # SlotDB Core
//!
//! Core engine for SlotDB, an embedded persistent key/value store with
//! optional per-key expiration.
//!
//! This crate provides:
//! - Slot-allocated segment files (power-of-two sized records, reused in place)
//! - WAL (Write-Ahead Log) for durability
//! - Crash recovery by replaying WAL entries past the segment checkpoint
//! - Per-segment background fsync/checkpoint and expired-key sweeping
//! - A sharded [`Db`] front-end dispatching keys across segments
//!
//! ## Quick Start
//!
//! ```no_run
//! use slotdb_core::{Config, Db};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # fn main() -> slotdb_core::CoreResult<()> {
//! let db = Db::open(Path::new("my_data"), Config::default())?;
//!
//! db.set("greeting", b"hello world", Duration::ZERO)?;
//! assert_eq!(db.get("greeting")?, b"hello world");
//!
//! db.delete("greeting")?;
//! db.close()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod database;
pub mod dir;
pub mod error;
pub mod hash;
pub mod segment;
pub mod stats;
pub mod types;
pub mod wal;

pub use config::Config;
pub use database::Db;
pub use error::{CoreError, CoreResult};
pub use segment::{Segment, SegmentOptions};
pub use stats::{DbStats, SegmentStats};
pub use types::{KeyHash, Lsn};
