//! Atomic counters.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// A counter that can be incremented and read atomically.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicUsize,
}

impl AtomicCounter {
    /// Increment the counter and return the new value.
    pub fn increment(&self) -> usize {
        self.value.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get the current value of the counter.
    pub fn get(&self) -> usize {
        self.value.load(Ordering::Relaxed)
    }
}

/// A sequence of numbers that never repeats a value.
///
/// Pooled resource identifiers are drawn from here rather than derived from
/// how many resources happen to be sitting in the queue, which would reuse a
/// number as soon as anything is checked out.
#[derive(Debug, Default)]
pub struct AtomicSequence {
    value: AtomicU64,
}

impl AtomicSequence {
    /// Get the next sequence number, starting from zero.
    pub fn next(&self) -> u64 {
        self.value.fetch_add(1, Ordering::SeqCst)
    }
}
