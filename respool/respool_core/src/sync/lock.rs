//! Mutex with contention statistics.
//!
//! Every resource carries one of these as its transition lock, and the
//! bounded pool guards its queue with one. The statistics, surfaced through
//! `PoolStats`, make it visible how often the typed scan skipped a resource
//! because another thread was mid-transition on it.

use log::trace;
use parking_lot::{Condvar, Mutex, MutexGuard};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

/// Statistics about lock usage
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LockStats {
    /// Number of successful acquisitions
    pub acquisition_count: usize,

    /// Number of `try_lock` attempts that found the lock held
    pub contended_count: usize,

    /// Total time the lock was held (microseconds)
    pub total_hold_time_us: u64,

    /// Longest single hold (microseconds)
    pub max_hold_time_us: u64,
}

impl LockStats {
    /// Fold another lock's statistics into these.
    pub fn merge(&mut self, other: &LockStats) {
        self.acquisition_count += other.acquisition_count;
        self.contended_count += other.contended_count;
        self.total_hold_time_us += other.total_hold_time_us;
        self.max_hold_time_us = self.max_hold_time_us.max(other.max_hold_time_us);
    }
}

#[derive(Debug, Default)]
struct StatCells {
    acquisition_count: AtomicUsize,
    contended_count: AtomicUsize,
    total_hold_time_us: AtomicU64,
    max_hold_time_us: AtomicU64,
}

impl StatCells {
    fn record_hold(&self, since: Instant) {
        let held_us = since.elapsed().as_micros() as u64;
        self.total_hold_time_us.fetch_add(held_us, Ordering::Relaxed);
        self.max_hold_time_us.fetch_max(held_us, Ordering::Relaxed);
    }
}

/// A mutex that records how it is used
pub struct TrackedMutex<T> {
    mutex: Mutex<T>,
    stats: StatCells,
    name: String,
}

/// Guard for a [`TrackedMutex`]; records the hold time when dropped
pub struct TrackedMutexGuard<'a, T> {
    guard: MutexGuard<'a, T>,
    acquired_at: Instant,
    stats: &'a StatCells,
    name: &'a str,
}

impl<T> TrackedMutex<T> {
    /// Create a tracked mutex with a name used in trace output
    pub fn new(value: T, name: impl Into<String>) -> Self {
        Self {
            mutex: Mutex::new(value),
            stats: StatCells::default(),
            name: name.into(),
        }
    }

    /// Lock the mutex, blocking until it is free
    pub fn lock(&self) -> TrackedMutexGuard<'_, T> {
        let guard = self.mutex.lock();
        self.stats.acquisition_count.fetch_add(1, Ordering::Relaxed);
        trace!("Lock acquired: {}", self.name);

        TrackedMutexGuard {
            guard,
            acquired_at: Instant::now(),
            stats: &self.stats,
            name: &self.name,
        }
    }

    /// Lock the mutex only if nobody else holds it
    pub fn try_lock(&self) -> Option<TrackedMutexGuard<'_, T>> {
        let Some(guard) = self.mutex.try_lock() else {
            self.stats.contended_count.fetch_add(1, Ordering::Relaxed);
            trace!("Lock busy: {}", self.name);
            return None;
        };

        self.stats.acquisition_count.fetch_add(1, Ordering::Relaxed);
        trace!("Lock acquired (try_lock): {}", self.name);

        Some(TrackedMutexGuard {
            guard,
            acquired_at: Instant::now(),
            stats: &self.stats,
            name: &self.name,
        })
    }

    /// Get the statistics for this mutex
    pub fn stats(&self) -> LockStats {
        LockStats {
            acquisition_count: self.stats.acquisition_count.load(Ordering::Relaxed),
            contended_count: self.stats.contended_count.load(Ordering::Relaxed),
            total_hold_time_us: self.stats.total_hold_time_us.load(Ordering::Relaxed),
            max_hold_time_us: self.stats.max_hold_time_us.load(Ordering::Relaxed),
        }
    }
}

impl<T> TrackedMutexGuard<'_, T> {
    /// Release the lock and block on `condvar` until notified or until
    /// `deadline` passes, then reacquire it.
    ///
    /// Returns `true` if the deadline passed. The time spent waiting is not
    /// counted as hold time.
    pub fn wait_until(&mut self, condvar: &Condvar, deadline: Instant) -> bool {
        self.stats.record_hold(self.acquired_at);
        let result = condvar.wait_until(&mut self.guard, deadline);
        self.acquired_at = Instant::now();
        result.timed_out()
    }
}

impl<T> Drop for TrackedMutexGuard<'_, T> {
    fn drop(&mut self) {
        self.stats.record_hold(self.acquired_at);
        trace!("Lock released: {}", self.name);
    }
}

impl<T> std::ops::Deref for TrackedMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<T> std::ops::DerefMut for TrackedMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_try_lock_counts_contention() {
        let mutex = TrackedMutex::new(0u32, "counter");

        let guard = mutex.lock();
        assert!(mutex.try_lock().is_none());
        assert!(mutex.try_lock().is_none());
        drop(guard);

        let mut guard = mutex.try_lock().expect("lock should be free");
        *guard += 1;
        drop(guard);

        let stats = mutex.stats();
        assert_eq!(stats.acquisition_count, 2);
        assert_eq!(stats.contended_count, 2);
        assert_eq!(*mutex.lock(), 1);
    }

    #[test]
    fn test_merge_sums_counts_and_keeps_longest_hold() {
        let mut total = LockStats {
            acquisition_count: 2,
            contended_count: 1,
            total_hold_time_us: 30,
            max_hold_time_us: 20,
        };
        total.merge(&LockStats {
            acquisition_count: 3,
            contended_count: 0,
            total_hold_time_us: 50,
            max_hold_time_us: 45,
        });

        assert_eq!(total.acquisition_count, 5);
        assert_eq!(total.contended_count, 1);
        assert_eq!(total.total_hold_time_us, 80);
        assert_eq!(total.max_hold_time_us, 45);
    }

    #[test]
    fn test_hold_time_is_recorded() {
        let mutex = TrackedMutex::new((), "slow");
        let guard = mutex.lock();
        thread::sleep(Duration::from_millis(5));
        drop(guard);

        let stats = mutex.stats();
        assert!(stats.max_hold_time_us >= 5_000);
        assert_eq!(stats.total_hold_time_us, stats.max_hold_time_us);
    }

    #[test]
    fn test_lock_across_threads() {
        let mutex = Arc::new(TrackedMutex::new(0usize, "shared"));
        let mut handles = vec![];

        for _ in 0..8 {
            let mutex = Arc::clone(&mutex);
            handles.push(thread::spawn(move || {
                for _ in 0..500 {
                    *mutex.lock() += 1;
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*mutex.lock(), 4000);
        assert_eq!(mutex.stats().acquisition_count, 4001);
    }

    #[test]
    fn test_wait_until_times_out() {
        let mutex = TrackedMutex::new((), "waiter");
        let condvar = Condvar::new();

        let start = Instant::now();
        let mut guard = mutex.lock();
        let timed_out = guard.wait_until(&condvar, start + Duration::from_millis(30));

        assert!(timed_out);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_wait_until_wakes_on_notify() {
        let shared = Arc::new((TrackedMutex::new(false, "flag"), Condvar::new()));
        let signaller = Arc::clone(&shared);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            *signaller.0.lock() = true;
            signaller.1.notify_one();
        });

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut guard = shared.0.lock();
        while !*guard {
            assert!(!guard.wait_until(&shared.1, deadline));
        }
        drop(guard);

        handle.join().unwrap();
    }
}
