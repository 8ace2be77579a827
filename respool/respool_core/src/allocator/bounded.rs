//! Bounded blocking pool of interchangeable resources.
//!
//! Free resources sit in a FIFO queue. A requester that finds the queue
//! empty registers as a waiter and sleeps on its own condition variable
//! until a resource is handed to it or its deadline passes. Returned
//! resources go straight to the oldest waiter, so waiters are served in
//! arrival order and a resource is never both queued and held.
//!
//! Lock order is always queue first, then the resource's transition lock.

use crate::error::{PoolError, Result};
use crate::id::ResourceId;
use crate::registry::{Registry, Slot};
use crate::resource::{requester_or_anonymous, Lease};
use crate::stats::PoolCounters;
use crate::sync::{LockStats, TrackedMutex};
use log::{debug, info, warn};
use parking_lot::Condvar;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Waiter {
    ticket: u64,
    requester: String,
    signal: Arc<Condvar>,
}

struct QueueState {
    /// Free resources, oldest return first
    available: VecDeque<Arc<Slot>>,

    /// Number of resources that belong to this pool
    capacity: usize,

    /// Blocked requesters in arrival order
    waiters: VecDeque<Waiter>,

    /// Resources handed to a waiter that has not woken up yet
    granted: HashMap<u64, Arc<Slot>>,

    next_ticket: u64,
}

/// FIFO pool with timed blocking acquisition
pub(crate) struct BoundedPool {
    registry: Arc<Registry>,
    counters: Arc<PoolCounters>,
    state: TrackedMutex<QueueState>,
}

impl BoundedPool {
    /// Create a pool pre-filled with `capacity` resources.
    pub(crate) fn new(
        registry: Arc<Registry>,
        counters: Arc<PoolCounters>,
        capacity: usize,
    ) -> Self {
        let pool = Self {
            registry,
            counters,
            state: TrackedMutex::new(
                QueueState {
                    available: VecDeque::with_capacity(capacity),
                    capacity: 0,
                    waiters: VecDeque::new(),
                    granted: HashMap::new(),
                    next_ticket: 0,
                },
                "bounded-queue",
            ),
        };

        for _ in 0..capacity {
            pool.add();
        }

        info!("Bounded pool initialized with {} resources", capacity);
        pool
    }

    /// Create a new resource and make it available, growing capacity by one.
    pub(crate) fn add(&self) -> ResourceId {
        let mut state = self.state.lock();
        let slot = self.registry.create(None);
        let id = slot.id();

        state.capacity += 1;
        self.hand_over(&mut state, slot);

        debug!("Added pooled resource {} (capacity {})", id, state.capacity);
        id
    }

    /// Take a resource from the front of the queue, waiting up to `timeout`
    /// for one to be returned if the queue is empty.
    pub(crate) fn acquire(&self, timeout: Duration, requester: &str) -> Result<ResourceId> {
        let start = Instant::now();
        let deadline = start
            .checked_add(timeout)
            .unwrap_or_else(|| start + Duration::from_secs(u32::MAX as u64));

        let mut state = self.state.lock();

        if let Some(slot) = state.available.pop_front() {
            check_out(&slot, requester);
            self.counters.bounded_acquisitions.increment();
            debug!("Checked out resource {} to '{}'", slot.id(), requester);
            return Ok(slot.id());
        }

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        let signal = Arc::new(Condvar::new());
        state.waiters.push_back(Waiter {
            ticket,
            requester: requester.to_string(),
            signal: Arc::clone(&signal),
        });
        debug!(
            "'{}' waiting for a resource ({} waiters)",
            requester,
            state.waiters.len()
        );

        loop {
            if let Some(slot) = state.granted.remove(&ticket) {
                self.counters.bounded_acquisitions.increment();
                debug!(
                    "Handed resource {} to '{}' after {:?}",
                    slot.id(),
                    requester,
                    start.elapsed()
                );
                return Ok(slot.id());
            }

            if state.wait_until(&signal, deadline) {
                // A hand-over may have landed right at the deadline.
                if let Some(slot) = state.granted.remove(&ticket) {
                    self.counters.bounded_acquisitions.increment();
                    return Ok(slot.id());
                }

                state.waiters.retain(|waiter| waiter.ticket != ticket);
                self.counters.bounded_timeouts.increment();
                warn!("'{}' timed out after {:?}", requester, timeout);
                return Err(PoolError::TimedOut(timeout));
            }
        }
    }

    /// Return a checked-out resource to the pool.
    pub(crate) fn release(&self, slot: Arc<Slot>, requester: Option<&str>) -> Result<()> {
        let mut state = self.state.lock();
        let transition = slot.begin();

        let Some(owner) = transition.read(|lease| lease.owner().map(str::to_string)) else {
            self.counters.rejected_releases.increment();
            return Err(PoolError::NotFoundOrAlreadyReleased(slot.id()));
        };

        if let Some(requester) = requester.map(requester_or_anonymous) {
            if owner != requester {
                self.counters.rejected_releases.increment();
                return Err(PoolError::OwnerMismatch {
                    id: slot.id(),
                    owner,
                    requester: requester.to_string(),
                });
            }
        }

        if state.available.len() >= state.capacity {
            warn!(
                "Release of {} into a full pool (capacity {})",
                slot.id(),
                state.capacity
            );
            return Err(PoolError::PoolCapacityViolation {
                id: slot.id(),
                capacity: state.capacity,
            });
        }

        debug!("Released pooled resource {} held by '{}'", slot.id(), owner);
        transition.update(Lease::clear);
        drop(transition);

        self.counters.releases.increment();
        self.hand_over(&mut state, slot);
        Ok(())
    }

    /// Number of resources sitting in the queue.
    pub(crate) fn available(&self) -> usize {
        self.state.lock().available.len()
    }

    /// Number of resources that belong to the pool, queued or checked out.
    pub(crate) fn capacity(&self) -> usize {
        self.state.lock().capacity
    }

    /// Number of requesters currently blocked.
    pub(crate) fn waiting(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Usage of the queue lock.
    pub(crate) fn lock_stats(&self) -> LockStats {
        self.state.stats()
    }

    /// Give a free resource to the oldest waiter, or queue it.
    fn hand_over(&self, state: &mut QueueState, slot: Arc<Slot>) {
        match state.waiters.pop_front() {
            Some(waiter) => {
                check_out(&slot, &waiter.requester);
                state.granted.insert(waiter.ticket, slot);
                waiter.signal.notify_one();
            }
            None => state.available.push_back(slot),
        }
    }
}

/// Mark a dequeued resource held by `requester`.
fn check_out(slot: &Slot, requester: &str) {
    let transition = slot.begin();
    assert!(
        transition.read(Lease::is_available),
        "resource {} was queued while allocated",
        slot.id()
    );
    transition.update(|lease| lease.grant(requester));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn pool(capacity: usize) -> Arc<BoundedPool> {
        Arc::new(BoundedPool::new(
            Arc::new(Registry::new()),
            Arc::new(PoolCounters::default()),
            capacity,
        ))
    }

    fn slot(pool: &BoundedPool, id: ResourceId) -> Arc<Slot> {
        pool.registry.get(&id).unwrap()
    }

    #[test]
    fn test_fifo_queue_order() {
        let pool = pool(3);
        assert_eq!(pool.available(), 3);

        let a = pool.acquire(Duration::ZERO, "a").unwrap();
        let b = pool.acquire(Duration::ZERO, "b").unwrap();
        assert_eq!(a, ResourceId::slot(0));
        assert_eq!(b, ResourceId::slot(1));

        pool.release(slot(&pool, a), None).unwrap();

        // slot 2 was queued before slot 0 came back
        assert_eq!(pool.acquire(Duration::ZERO, "c").unwrap(), ResourceId::slot(2));
        assert_eq!(pool.acquire(Duration::ZERO, "d").unwrap(), a);
    }

    #[test]
    fn test_add_never_reuses_ids() {
        let pool = pool(2);
        let held = pool.acquire(Duration::ZERO, "a").unwrap();

        // one checked out, one queued: a length-based id would collide here
        let added = pool.add();
        assert_eq!(added, ResourceId::slot(2));
        assert_ne!(added, held);
        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_add_wakes_waiter() {
        let pool = pool(0);
        let waiter = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.acquire(Duration::from_secs(5), "w"))
        };

        while pool.waiting() == 0 {
            thread::yield_now();
        }

        let added = pool.add();
        assert_eq!(waiter.join().unwrap().unwrap(), added);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_release_rejects_free_resource() {
        let pool = pool(1);
        let id = ResourceId::slot(0);

        let err = pool.release(slot(&pool, id), None).unwrap_err();
        assert_eq!(err, PoolError::NotFoundOrAlreadyReleased(id));
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.counters.rejected_releases.get(), 1);
    }

    #[test]
    fn test_release_into_full_queue_fails_fast() {
        let pool = pool(1);
        let id = pool.acquire(Duration::ZERO, "a").unwrap();

        // Simulate a lifecycle bug: the queue believes it is already full.
        pool.state.lock().capacity = 0;

        let err = pool.release(slot(&pool, id), None).unwrap_err();
        assert_eq!(err, PoolError::PoolCapacityViolation { id, capacity: 0 });
        assert!(!slot(&pool, id).snapshot().is_available());
    }

    #[test]
    fn test_returned_resource_carries_nothing_from_previous_holder() {
        let pool = pool(1);
        let id = pool.acquire(Duration::ZERO, "first").unwrap();
        pool.release(slot(&pool, id), Some("first")).unwrap();

        let queued = slot(&pool, id).snapshot();
        assert!(queued.is_available());
        assert!(queued.owner.is_none());
        assert!(queued.acquired_at.is_none());

        pool.acquire(Duration::ZERO, "second").unwrap();
        let snapshot = slot(&pool, id).snapshot();
        assert_eq!(snapshot.owner.as_deref(), Some("second"));
        assert_eq!(snapshot.lease_count, 2);
    }

    #[test]
    fn test_blank_requester_matches_anonymous_holder() {
        let pool = pool(1);
        let id = pool.acquire(Duration::ZERO, "").unwrap();
        assert_eq!(slot(&pool, id).snapshot().owner.as_deref(), Some("anonymous"));

        pool.release(slot(&pool, id), Some("")).unwrap();
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_queue_lock_stats() {
        let pool = pool(1);
        let before = pool.lock_stats().acquisition_count;

        let id = pool.acquire(Duration::ZERO, "a").unwrap();
        pool.release(slot(&pool, id), None).unwrap();

        assert_eq!(pool.lock_stats().acquisition_count, before + 2);
    }

    #[test]
    fn test_timeout_removes_waiter() {
        let pool = pool(0);
        let start = Instant::now();

        let err = pool.acquire(Duration::from_millis(50), "late").unwrap_err();
        assert_eq!(err, PoolError::TimedOut(Duration::from_millis(50)));
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(pool.waiting(), 0);

        // A resource added afterwards must not be handed to the departed waiter.
        pool.add();
        assert_eq!(pool.available(), 1);
    }
}
