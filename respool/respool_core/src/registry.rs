//! Registry of every resource known to a pool.
//!
//! The registry only grows. Enumeration always copies the relevant slot
//! handles out under a short read lock and iterates the copy, so a resource
//! added mid-scan never disturbs a scan already in progress.

use crate::error::{PoolError, Result};
use crate::id::ResourceId;
use crate::resource::{Lease, Resource};
use crate::sync::{AtomicSequence, LockStats, TrackedMutex, TrackedMutexGuard};
use log::trace;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One registered resource: immutable identity plus its lease state.
///
/// Two locks guard the lease. `transition` is held for the whole of a grant
/// or release decision and is the lock the typed scan tries. `lease` is only
/// ever held for a copy or a single mutation, so a snapshot never makes a
/// free resource look busy to the scan. Order: `transition`, then `lease`.
pub(crate) struct Slot {
    id: ResourceId,
    kind: Option<String>,
    /// Mirror of `lease.is_available()`, written only inside a transition.
    /// Readers without the lock treat it as a hint.
    available_hint: AtomicBool,
    transition: TrackedMutex<()>,
    lease: Mutex<Lease>,
}

/// Exclusive right to change a slot's lease; dropping it ends the transition.
pub(crate) struct Transition<'a> {
    slot: &'a Slot,
    _guard: TrackedMutexGuard<'a, ()>,
}

impl Transition<'_> {
    pub(crate) fn read<R>(&self, f: impl FnOnce(&Lease) -> R) -> R {
        f(&self.slot.lease.lock())
    }

    /// Mutate the lease and refresh the availability hint.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut Lease) -> R) -> R {
        let mut lease = self.slot.lease.lock();
        let result = f(&mut lease);
        self.slot
            .available_hint
            .store(lease.is_available(), Ordering::Release);
        result
    }
}

impl Slot {
    fn new(id: ResourceId, kind: Option<String>) -> Self {
        Self {
            id,
            kind,
            available_hint: AtomicBool::new(true),
            transition: TrackedMutex::new((), format!("resource-{}", id)),
            lease: Mutex::new(Lease::new()),
        }
    }

    pub(crate) fn id(&self) -> ResourceId {
        self.id
    }

    pub(crate) fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Start a transition, waiting for any other one to finish.
    pub(crate) fn begin(&self) -> Transition<'_> {
        Transition {
            slot: self,
            _guard: self.transition.lock(),
        }
    }

    /// Start a transition only if nobody else is mid-transition.
    pub(crate) fn try_begin(&self) -> Option<Transition<'_>> {
        let guard = self.transition.try_lock()?;
        Some(Transition {
            slot: self,
            _guard: guard,
        })
    }

    /// Unlocked, possibly stale read of the availability.
    pub(crate) fn looks_available(&self) -> bool {
        self.available_hint.load(Ordering::Acquire)
    }

    pub(crate) fn snapshot(&self) -> Resource {
        self.lease.lock().snapshot(self.id, self.kind())
    }

    pub(crate) fn lock_stats(&self) -> LockStats {
        self.transition.stats()
    }
}

#[derive(Default)]
struct Index {
    slots: Vec<Arc<Slot>>,
    by_id: HashMap<ResourceId, usize>,
    by_type: HashMap<String, Vec<usize>>,
}

/// Owns every resource of a pool and indexes typed resources by type.
#[derive(Default)]
pub(crate) struct Registry {
    index: RwLock<Index>,
    sequence: AtomicSequence,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a new available resource.
    ///
    /// Typed resources receive a fresh token, untyped ones the next number
    /// of the slot sequence.
    pub(crate) fn create(&self, kind: Option<&str>) -> Arc<Slot> {
        let mut index = self.index.write();

        let id = match kind {
            Some(_) => loop {
                let id = ResourceId::token();
                if !index.by_id.contains_key(&id) {
                    break id;
                }
            },
            None => ResourceId::slot(self.sequence.next()),
        };

        let slot = Arc::new(Slot::new(id, kind.map(str::to_string)));
        let position = index.slots.len();
        index.slots.push(Arc::clone(&slot));
        index.by_id.insert(id, position);
        if let Some(kind) = kind {
            index
                .by_type
                .entry(kind.to_string())
                .or_default()
                .push(position);
        }

        trace!("Registered resource {} (type: {:?})", id, kind);
        slot
    }

    pub(crate) fn get(&self, id: &ResourceId) -> Result<Arc<Slot>> {
        let index = self.index.read();
        index
            .by_id
            .get(id)
            .map(|&position| Arc::clone(&index.slots[position]))
            .ok_or(PoolError::NotFound(*id))
    }

    /// Every resource, in creation order.
    pub(crate) fn all(&self) -> Vec<Arc<Slot>> {
        self.index.read().slots.clone()
    }

    /// Resources tagged `kind`, in creation order.
    pub(crate) fn by_type(&self, kind: &str) -> Vec<Arc<Slot>> {
        let index = self.index.read();
        index
            .by_type
            .get(kind)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&position| Arc::clone(&index.slots[position]))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.index.read().slots.len()
    }

    /// Transition lock statistics summed over every resource.
    pub(crate) fn lock_stats(&self) -> LockStats {
        self.all()
            .iter()
            .fold(LockStats::default(), |mut total, slot| {
                total.merge(&slot.lock_stats());
                total
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_and_untyped_ids() {
        let registry = Registry::new();

        let gpu = registry.create(Some("GPU"));
        let first = registry.create(None);
        let second = registry.create(None);

        assert!(gpu.id().is_token());
        assert_eq!(first.id(), ResourceId::slot(0));
        assert_eq!(second.id(), ResourceId::slot(1));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_by_type_keeps_creation_order() {
        let registry = Registry::new();

        let a = registry.create(Some("GPU")).id();
        registry.create(Some("FPGA"));
        let b = registry.create(Some("GPU")).id();
        registry.create(None);

        let ids: Vec<_> = registry.by_type("GPU").iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![a, b]);
        assert!(registry.by_type("TPU").is_empty());
    }

    #[test]
    fn test_get_unknown_id() {
        let registry = Registry::new();
        let id = ResourceId::slot(42);
        assert_eq!(registry.get(&id).err(), Some(PoolError::NotFound(id)));
    }

    #[test]
    fn test_snapshot_taken_before_append_is_stable() {
        let registry = Registry::new();
        registry.create(Some("GPU"));

        let snapshot = registry.by_type("GPU");
        registry.create(Some("GPU"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.by_type("GPU").len(), 2);
    }

    #[test]
    fn test_hint_follows_lease() {
        let registry = Registry::new();
        let slot = registry.create(Some("GPU"));
        assert!(slot.looks_available());

        slot.begin().update(|lease| lease.grant("r1"));

        assert!(!slot.looks_available());
        assert_eq!(slot.snapshot().owner.as_deref(), Some("r1"));
    }

    #[test]
    fn test_snapshot_does_not_block_transition() {
        let registry = Registry::new();
        let slot = registry.create(Some("GPU"));

        let transition = slot.try_begin().expect("no transition in progress");
        assert!(slot.snapshot().is_available());
        assert!(slot.try_begin().is_none());
        drop(transition);

        // Taking snapshots never touches the transition lock.
        for _ in 0..10 {
            slot.snapshot();
        }
        assert!(slot.try_begin().is_some());

        let stats = slot.lock_stats();
        assert_eq!(stats.acquisition_count, 2);
        assert_eq!(stats.contended_count, 1);
    }

    #[test]
    fn test_lock_stats_sum_over_resources() {
        let registry = Registry::new();
        let a = registry.create(Some("GPU"));
        let b = registry.create(None);

        drop(a.begin());
        drop(b.begin());
        let busy = b.begin();
        assert!(b.try_begin().is_none());
        drop(busy);

        let stats = registry.lock_stats();
        assert_eq!(stats.acquisition_count, 3);
        assert_eq!(stats.contended_count, 1);
    }
}
