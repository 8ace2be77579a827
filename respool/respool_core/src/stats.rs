//! Pool-wide counters.

use crate::sync::{AtomicCounter, LockStats};
use serde::Serialize;

/// Statistics about a pool's activity
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Resources handed out by the typed scan
    pub typed_acquisitions: usize,

    /// Typed requests that found nothing free
    pub typed_misses: usize,

    /// Candidates the typed scan skipped because their lock was busy
    pub contended_skips: usize,

    /// Resources handed out by the bounded pool
    pub bounded_acquisitions: usize,

    /// Bounded requests that hit their deadline
    pub bounded_timeouts: usize,

    /// Successful releases in either mode
    pub releases: usize,

    /// Releases rejected because the resource was not held
    pub rejected_releases: usize,

    /// Transition locks of every resource, summed
    pub slot_locks: LockStats,

    /// The bounded pool's queue lock
    pub queue_lock: LockStats,
}

/// Live counters shared by the allocators
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub(crate) typed_acquisitions: AtomicCounter,
    pub(crate) typed_misses: AtomicCounter,
    pub(crate) contended_skips: AtomicCounter,
    pub(crate) bounded_acquisitions: AtomicCounter,
    pub(crate) bounded_timeouts: AtomicCounter,
    pub(crate) releases: AtomicCounter,
    pub(crate) rejected_releases: AtomicCounter,
}

impl PoolCounters {
    pub(crate) fn snapshot(&self) -> PoolStats {
        PoolStats {
            typed_acquisitions: self.typed_acquisitions.get(),
            typed_misses: self.typed_misses.get(),
            contended_skips: self.contended_skips.get(),
            bounded_acquisitions: self.bounded_acquisitions.get(),
            bounded_timeouts: self.bounded_timeouts.get(),
            releases: self.releases.get(),
            rejected_releases: self.rejected_releases.get(),
            slot_locks: LockStats::default(),
            queue_lock: LockStats::default(),
        }
    }
}
