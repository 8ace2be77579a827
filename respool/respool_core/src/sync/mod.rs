//! Synchronization primitives used by the allocators.
//!
//! - Tracked mutexes that record acquisition, contention and hold times
//! - Atomic counters and sequences for identifiers and statistics

pub mod atomic;
pub mod lock;

pub use atomic::{AtomicCounter, AtomicSequence};
pub use lock::{LockStats, TrackedMutex, TrackedMutexGuard};
