//! Per-segment background maintenance loops.
//!
//! Each segment optionally runs two threads: a periodic fsync/checkpoint and
//! a periodic expired-key sweep. Both tick on `recv_timeout` against a
//! shutdown channel, so a close signal is observed within one period. The
//! threads hold only a weak reference to the segment and exit on their own if
//! it is dropped.

use crate::segment::store::Segment;
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

/// Handle over a segment's background threads.
///
/// Dropping the senders signals the loops to stop; [`TaskHandle::shutdown`]
/// additionally joins them so close strictly follows the last tick.
pub(crate) struct TaskHandle {
    shutdown_txs: Vec<SyncSender<()>>,
    handles: Vec<JoinHandle<()>>,
}

impl TaskHandle {
    /// Signals both loops and waits for them to exit.
    pub(crate) fn shutdown(mut self) {
        self.shutdown_txs.clear();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Spawns the maintenance loops for `segment`. A zero period disables the
/// corresponding loop.
pub(crate) fn spawn_maintenance(
    segment: &Arc<Segment>,
    sync_period: Duration,
    sweep_period: Duration,
) -> TaskHandle {
    let mut handle = TaskHandle {
        shutdown_txs: Vec::new(),
        handles: Vec::new(),
    };

    if !sync_period.is_zero() {
        let (tx, rx) = sync_channel(1);
        let weak = Arc::downgrade(segment);
        handle.shutdown_txs.push(tx);
        handle
            .handles
            .push(std::thread::spawn(move || fsync_loop(&weak, &rx, sync_period)));
    }

    if !sweep_period.is_zero() {
        let (tx, rx) = sync_channel(1);
        let weak = Arc::downgrade(segment);
        handle.shutdown_txs.push(tx);
        handle
            .handles
            .push(std::thread::spawn(move || sweep_loop(&weak, &rx, sweep_period)));
    }

    handle
}

fn fsync_loop(segment: &Weak<Segment>, shutdown: &Receiver<()>, period: Duration) {
    debug!(period_ms = period.as_millis() as u64, "fsync loop started");

    loop {
        match shutdown.recv_timeout(period) {
            Err(RecvTimeoutError::Timeout) => {
                let Some(segment) = segment.upgrade() else {
                    break;
                };

                if let Err(err) = segment.fsync() {
                    warn!(error = %err, "periodic fsync failed");
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!("fsync loop stopped");
}

fn sweep_loop(segment: &Weak<Segment>, shutdown: &Receiver<()>, period: Duration) {
    debug!(period_ms = period.as_millis() as u64, "sweep loop started");

    loop {
        match shutdown.recv_timeout(period) {
            Err(RecvTimeoutError::Timeout) => {
                let Some(segment) = segment.upgrade() else {
                    break;
                };

                match segment.sweep_expired() {
                    Ok(0) => {}
                    Ok(swept) => debug!(swept, "evicted expired keys"),
                    Err(err) => warn!(error = %err, "expired sweep failed"),
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!("sweep loop stopped");
}
