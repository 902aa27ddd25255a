//! # SlotDB Storage
//!
//! Storage backend trait and implementations for SlotDB.
//!
//! This crate provides the lowest-level storage abstraction for SlotDB.
//! Storage backends are **opaque byte stores** - they do not interpret
//! the data they store.
//!
//! ## Design Principles
//!
//! - Backends are simple byte stores (positional read/write, append, sync)
//! - No knowledge of SlotDB file formats, slots, or the WAL
//! - Must be `Send + Sync` for concurrent access
//! - No interior locking: reads are positional and cursor-free, writes are
//!   serialized by the caller through `&mut self`
//! - SlotDB owns all file format interpretation
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use slotdb_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"hello world").unwrap();
//! let data = backend.read_at(offset, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
