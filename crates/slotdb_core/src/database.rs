//! The sharded database front-end.
//!
//! A [`Db`] owns a locked data directory and a fixed number of independent
//! [`Segment`]s. Keys are hashed with murmur3_32 and dispatched to
//! `segments[hash % N]`; the same hash doubles as the bucket key inside the
//! segment. There is no cross-segment coordination.

use crate::config::Config;
use crate::dir::DataDir;
use crate::error::CoreResult;
use crate::hash;
use crate::segment::{Segment, SegmentOptions};
use crate::stats::DbStats;
use crate::types::unix_now;
use rand::Rng;
use slotdb_storage::{FileBackend, StorageBackend};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// An embedded, persistent key/value store with optional per-key expiration,
/// sharded across independent segments.
///
/// # Example
///
/// ```no_run
/// use slotdb_core::{Config, Db};
/// use std::path::Path;
/// use std::time::Duration;
///
/// # fn main() -> slotdb_core::CoreResult<()> {
/// let db = Db::open(Path::new("data"), Config::default())?;
/// db.set("user:42", b"{\"name\":\"ada\"}", Duration::from_secs(3600))?;
/// let value = db.get("user:42")?;
/// db.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Db {
    #[allow(dead_code)] // held for the directory lock's lifetime
    dir: DataDir,
    segments: Vec<Arc<Segment>>,
}

impl Db {
    /// Opens or creates a database rooted at `path`.
    ///
    /// Missing directories and files are created; existing segments are
    /// recovered (index rebuild plus WAL replay). Background loops start
    /// with per-segment jittered periods.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, a locked directory, or any recovery
    /// error.
    pub fn open(path: &Path, config: Config) -> CoreResult<Self> {
        config.validate()?;

        let dir = DataDir::open(path)?;
        let mut segments = Vec::with_capacity(config.segment_count);

        for i in 0..config.segment_count {
            let data = FileBackend::open(&dir.data_path(i))?;

            let wal: Option<Box<dyn StorageBackend>> = if config.use_wal {
                Some(Box::new(FileBackend::open(&dir.wal_path(i))?))
            } else {
                None
            };

            let options = SegmentOptions {
                sync_period: jittered(config.sync_period, config.sync_jitter_max),
                sweep_period: jittered(config.sweep_period, config.sweep_jitter_max),
            };

            segments.push(Segment::open(Box::new(data), wal, options)?);
        }

        info!(
            path = %path.display(),
            segments = segments.len(),
            wal = config.use_wal,
            "database opened"
        );

        Ok(Self { dir, segments })
    }

    /// Sets `key` to `value` with a time-to-live.
    ///
    /// A zero `ttl` means the key never expires. Expiry has one-second
    /// precision; sub-second TTLs round down.
    ///
    /// # Errors
    ///
    /// Returns a storage error on I/O failure.
    pub fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CoreResult<()> {
        let key = key.as_bytes();
        let key_hash = hash::hash_key(key);

        let expire = if ttl.is_zero() {
            0
        } else {
            unix_now() + ttl.as_secs() as u32
        };

        self.segment_for(key_hash).set(key_hash, key, value, expire)
    }

    /// Returns the current value of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the key is absent, deleted, or
    /// expired.
    pub fn get(&self, key: &str) -> CoreResult<Vec<u8>> {
        let key = key.as_bytes();
        let key_hash = hash::hash_key(key);

        self.segment_for(key_hash).get(key_hash, key)
    }

    /// Deletes `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no live entry exists.
    pub fn delete(&self, key: &str) -> CoreResult<()> {
        let key = key.as_bytes();
        let key_hash = hash::hash_key(key);

        self.segment_for(key_hash).delete(key_hash, key)
    }

    /// Closes every segment: background loops stop, files are fsynced, WALs
    /// checkpointed. Segments close from parallel threads.
    ///
    /// # Errors
    ///
    /// Returns the first close error encountered; remaining segments are
    /// still closed.
    pub fn close(self) -> CoreResult<()> {
        let results: Vec<CoreResult<()>> = std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .segments
                .iter()
                .map(|segment| scope.spawn(move || segment.close()))
                .collect();

            handles
                .into_iter()
                .map(|h| h.join().expect("segment close task panicked"))
                .collect()
        });

        for result in results {
            result?;
        }

        Ok(())
    }

    /// A point-in-time snapshot across all segments.
    ///
    /// # Errors
    ///
    /// Returns a storage error if any segment's stats cannot be read.
    pub fn stats(&self) -> CoreResult<DbStats> {
        let segments = self
            .segments
            .iter()
            .map(|s| s.stats())
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(DbStats { segments })
    }

    fn segment_for(&self, key_hash: u32) -> &Segment {
        &self.segments[hash::segment_index(key_hash, self.segments.len())]
    }
}

/// Adds a random delta in `[0, max]` to `period`. A zero period stays zero
/// (the loop is disabled); a zero max leaves the period unchanged.
fn jittered(period: Duration, max: Duration) -> Duration {
    if period.is_zero() || max.is_zero() {
        return period;
    }

    let delta = rand::thread_rng().gen_range(0..=max.as_millis() as u64);
    period + Duration::from_millis(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use tempfile::tempdir;

    fn test_config() -> Config {
        // Background loops are driven explicitly in tests.
        Config::new()
            .segment_count(4)
            .sync_period(Duration::ZERO)
            .sweep_period(Duration::ZERO)
    }

    #[test]
    fn set_get_delete_roundtrip() {
        let dir = tempdir().unwrap();
        let db = Db::open(dir.path(), test_config()).unwrap();

        db.set("key1", b"value1", Duration::ZERO).unwrap();
        assert_eq!(db.get("key1").unwrap(), b"value1");

        db.delete("key1").unwrap();
        assert!(matches!(db.get("key1"), Err(CoreError::NotFound)));

        db.close().unwrap();
    }

    #[test]
    fn keys_spread_across_segments() {
        let dir = tempdir().unwrap();
        let db = Db::open(dir.path(), test_config()).unwrap();

        for i in 0..64 {
            db.set(&format!("key-{i}"), format!("value-{i}").as_bytes(), Duration::ZERO)
                .unwrap();
        }

        let stats = db.stats().unwrap();
        assert_eq!(stats.live_keys(), 64);
        // With murmur3 over 64 keys every one of 4 segments should see some.
        assert!(stats.segments.iter().all(|s| s.live_keys > 0));

        db.close().unwrap();
    }

    #[test]
    fn second_open_of_same_directory_is_locked_out() {
        let dir = tempdir().unwrap();
        let db = Db::open(dir.path(), test_config()).unwrap();

        let second = Db::open(dir.path(), test_config());
        assert!(matches!(second, Err(CoreError::DatabaseLocked)));

        db.close().unwrap();
    }

    #[test]
    fn zero_segments_is_rejected() {
        let dir = tempdir().unwrap();
        let result = Db::open(dir.path(), test_config().segment_count(0));
        assert!(matches!(result, Err(CoreError::InvalidSegmentsNum)));
    }

    #[test]
    fn empty_path_is_rejected() {
        let result = Db::open(Path::new(""), test_config());
        assert!(matches!(result, Err(CoreError::InvalidPath)));
    }

    #[test]
    fn ttl_zero_never_expires() {
        let dir = tempdir().unwrap();
        let db = Db::open(dir.path(), test_config()).unwrap();

        db.set("forever", b"v", Duration::ZERO).unwrap();
        assert_eq!(db.get("forever").unwrap(), b"v");

        db.close().unwrap();
    }

    #[test]
    fn subsecond_ttl_rounds_down_to_immediate_expiry() {
        let dir = tempdir().unwrap();
        let db = Db::open(dir.path(), test_config()).unwrap();

        db.set("blink", b"v", Duration::from_millis(100)).unwrap();
        // expire == now, and expire <= now means expired
        assert!(matches!(db.get("blink"), Err(CoreError::NotFound)));

        db.close().unwrap();
    }

    #[test]
    fn jitter_respects_bounds() {
        let period = Duration::from_secs(10);
        assert_eq!(jittered(period, Duration::ZERO), period);
        assert_eq!(jittered(Duration::ZERO, Duration::from_secs(5)), Duration::ZERO);

        let max = Duration::from_secs(3);
        for _ in 0..32 {
            let j = jittered(period, max);
            assert!(j >= period && j <= period + max);
        }
    }

    #[test]
    fn directory_layout_matches_contract() {
        let dir = tempdir().unwrap();
        let db = Db::open(dir.path(), test_config().segment_count(2)).unwrap();
        db.close().unwrap();

        assert!(dir.path().join("0_data.bin").exists());
        assert!(dir.path().join("1_data.bin").exists());
        assert!(dir.path().join("0_wal.bin").exists());
        assert!(dir.path().join("1_wal.bin").exists());
        assert!(!dir.path().join("2_data.bin").exists());
    }

    #[test]
    fn wal_disabled_creates_no_wal_files() {
        let dir = tempdir().unwrap();
        let db = Db::open(dir.path(), test_config().segment_count(2).use_wal(false)).unwrap();
        db.set("key1", b"value1", Duration::ZERO).unwrap();
        db.close().unwrap();

        assert!(dir.path().join("0_data.bin").exists());
        assert!(!dir.path().join("0_wal.bin").exists());
    }
}
