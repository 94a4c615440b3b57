//! Store operation statistics.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters tracked by the store.
///
/// All fields are atomic for lock-free, thread-safe updates; none of them
/// ride on the store's structure locks. `Ordering::Relaxed` throughout:
/// we only need atomicity, and the counters are read for reporting, not
/// for synchronization.
#[derive(Debug, Default)]
pub struct StoreStats {
    /// Completed query operations (get/get_all/range/category).
    pub reads: AtomicU64,

    /// Completed mutations (add/remove/update), including rejected ones.
    pub writes: AtomicU64,

    /// Successful snapshot saves.
    pub snapshot_saves: AtomicU64,

    /// Successful snapshot restores.
    pub snapshot_restores: AtomicU64,
}

impl StoreStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a non-atomic snapshot of current counters for display/logging.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            snapshot_saves: self.snapshot_saves.load(Ordering::Relaxed),
            snapshot_restores: self.snapshot_restores.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`StoreStats`] counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub reads: u64,
    pub writes: u64,
    pub snapshot_saves: u64,
    pub snapshot_restores: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reads={} writes={} saves={} restores={}",
            self.reads, self.writes, self.snapshot_saves, self.snapshot_restores
        )
    }
}
