//! Typed scan allocation.
//!
//! A request names a type; any free resource of that type satisfies it. The
//! scan never waits: it walks the candidates in creation order and returns
//! the first one it can claim, or fails immediately.

use crate::error::{PoolError, Result};
use crate::id::ResourceId;
use crate::registry::{Registry, Slot};
use crate::resource::{requester_or_anonymous, Lease};
use crate::stats::PoolCounters;
use log::{debug, trace};
use std::sync::Arc;

/// Non-blocking allocator over typed resources
pub(crate) struct TypedAllocator {
    registry: Arc<Registry>,
    counters: Arc<PoolCounters>,
}

impl TypedAllocator {
    pub(crate) fn new(registry: Arc<Registry>, counters: Arc<PoolCounters>) -> Self {
        Self { registry, counters }
    }

    /// Register a new available resource of type `kind`.
    pub(crate) fn add(&self, kind: &str) -> ResourceId {
        self.registry.create(Some(kind)).id()
    }

    /// Claim the first free resource of type `kind` for `requester`.
    pub(crate) fn request(&self, kind: &str, requester: &str) -> Result<ResourceId> {
        for slot in self.registry.by_type(kind) {
            if let Some(id) = self.try_claim(&slot, requester) {
                self.counters.typed_acquisitions.increment();
                debug!("Allocated {} resource {} to '{}'", kind, id, requester);
                return Ok(id);
            }
        }

        self.counters.typed_misses.increment();
        debug!("No {} resource available for '{}'", kind, requester);
        Err(PoolError::NoResourceAvailable {
            kind: kind.to_string(),
        })
    }

    fn try_claim(&self, slot: &Slot, requester: &str) -> Option<ResourceId> {
        // Stale read, only used to avoid locking resources that are clearly busy.
        if !slot.looks_available() {
            trace!("Skipping {}: allocated", slot.id());
            return None;
        }

        let Some(transition) = slot.try_begin() else {
            self.counters.contended_skips.increment();
            trace!("Skipping {}: mid-transition", slot.id());
            return None;
        };

        // The hint may be out of date by now; the locked check is authoritative.
        if !transition.read(Lease::is_available) {
            trace!("Skipping {}: lost race", slot.id());
            return None;
        }

        transition.update(|lease| lease.grant(requester));
        Some(slot.id())
    }

    /// Return an allocated typed resource.
    ///
    /// When `requester` is given it must match the recorded owner.
    pub(crate) fn release(&self, slot: &Slot, requester: Option<&str>) -> Result<()> {
        let transition = slot.begin();

        let Some(owner) = transition.read(|lease| lease.owner().map(str::to_string)) else {
            self.counters.rejected_releases.increment();
            return Err(PoolError::NotAllocated(slot.id()));
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

        debug!("Released resource {} held by '{}'", slot.id(), owner);
        transition.update(Lease::clear);
        self.counters.releases.increment();
        Ok(())
    }
}
