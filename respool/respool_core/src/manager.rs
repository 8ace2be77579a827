//! The pool manager facade.
//!
//! `PoolManager` is the only type external callers (a transport layer, the
//! CLI) talk to. It owns one registry shared by a typed scan allocator and a
//! bounded blocking pool, and routes each call to the right one: resources
//! added with a type tag are allocated by type scan, untyped ones belong to
//! the bounded pool.
//!
//! The manager is constructed once and shared by reference or `Arc`; every
//! operation takes `&self`.

use crate::allocator::{BoundedPool, TypedAllocator};
use crate::config::{ConfigError, PoolConfig};
use crate::error::Result;
use crate::id::ResourceId;
use crate::registry::Registry;
use crate::resource::{Resource, ANONYMOUS_REQUESTER};
use crate::stats::{PoolCounters, PoolStats};
use log::info;
use std::sync::Arc;
use std::time::Duration;

/// Brokers exclusive access to typed and pooled resources
pub struct PoolManager {
    registry: Arc<Registry>,
    typed: TypedAllocator,
    bounded: BoundedPool,
    counters: Arc<PoolCounters>,
    acquire_timeout: Duration,
}

impl PoolManager {
    /// Create a manager whose bounded pool starts with `capacity` resources
    /// and no typed resources.
    pub fn new(capacity: usize) -> Self {
        Self::with_timeout(capacity, PoolConfig::default().acquire_timeout())
    }

    fn with_timeout(capacity: usize, acquire_timeout: Duration) -> Self {
        let registry = Arc::new(Registry::new());
        let counters = Arc::new(PoolCounters::default());

        let typed = TypedAllocator::new(Arc::clone(&registry), Arc::clone(&counters));
        let bounded = BoundedPool::new(Arc::clone(&registry), Arc::clone(&counters), capacity);

        Self {
            registry,
            typed,
            bounded,
            counters,
            acquire_timeout,
        }
    }

    /// Build a manager from a validated configuration.
    ///
    /// The bounded pool is filled to `capacity` and every typed seed is
    /// registered in the order listed.
    pub fn from_config(config: &PoolConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let manager = Self::with_timeout(config.capacity, config.acquire_timeout());
        for seed in &config.resources {
            for _ in 0..seed.count {
                manager.typed.add(&seed.kind);
            }
        }

        info!(
            "Pool manager ready: {} pooled, {} typed resources",
            manager.bounded.capacity(),
            manager.registry.len() - manager.bounded.capacity()
        );
        Ok(manager)
    }

    /// Register a new resource.
    ///
    /// With a type tag the resource joins the typed scan; without one it is
    /// added to the bounded pool and grows its capacity by one.
    pub fn add_resource(&self, kind: Option<&str>) -> ResourceId {
        let id = match kind {
            Some(kind) => self.typed.add(kind),
            None => self.bounded.add(),
        };
        info!("Resource added: {} (type: {})", id, kind.unwrap_or("-"));
        id
    }

    /// Claim a free resource of type `kind` for `requester`.
    ///
    /// Never blocks; fails with `NoResourceAvailable` when every resource of
    /// that type is held.
    pub fn request_typed(&self, kind: &str, requester: &str) -> Result<ResourceId> {
        self.typed.request(kind, requester)
    }

    /// Take a resource from the bounded pool, waiting up to `timeout`.
    pub fn request_bounded(&self, timeout: Duration) -> Result<ResourceId> {
        self.bounded.acquire(timeout, ANONYMOUS_REQUESTER)
    }

    /// Like [`request_bounded`](Self::request_bounded), recording
    /// `requester` as the holder.
    pub fn request_bounded_as(&self, timeout: Duration, requester: &str) -> Result<ResourceId> {
        self.bounded.acquire(timeout, requester)
    }

    /// Release a held resource.
    ///
    /// When `requester` is given it must be the current holder. Releasing a
    /// resource that is not held fails and leaves the pool unchanged.
    pub fn release(&self, id: &ResourceId, requester: Option<&str>) -> Result<()> {
        let slot = self.registry.get(id)?;
        if slot.kind().is_some() {
            self.typed.release(&slot, requester)
        } else {
            self.bounded.release(slot, requester)
        }
    }

    /// Snapshot of one resource.
    pub fn get(&self, id: &ResourceId) -> Result<Resource> {
        Ok(self.registry.get(id)?.snapshot())
    }

    /// Snapshot of every resource, in creation order.
    pub fn list_all(&self) -> Vec<Resource> {
        self.registry
            .all()
            .iter()
            .map(|slot| slot.snapshot())
            .collect()
    }

    /// Snapshot of every resource that is currently free.
    pub fn list_available(&self) -> Vec<Resource> {
        self.list_all()
            .into_iter()
            .filter(Resource::is_available)
            .collect()
    }

    /// Total number of resources, typed and pooled.
    pub fn count(&self) -> usize {
        self.registry.len()
    }

    /// Number of pooled resources waiting in the bounded queue.
    pub fn available(&self) -> usize {
        self.bounded.available()
    }

    /// Number of resources that belong to the bounded pool.
    pub fn capacity(&self) -> usize {
        self.bounded.capacity()
    }

    /// Number of requesters blocked on the bounded pool.
    pub fn waiting(&self) -> usize {
        self.bounded.waiting()
    }

    /// Default timeout for bounded requests, from configuration.
    pub fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }

    /// Activity counters and lock usage.
    pub fn stats(&self) -> PoolStats {
        let mut stats = self.counters.snapshot();
        stats.slot_locks = self.registry.lock_stats();
        stats.queue_lock = self.bounded.lock_stats();
        stats
    }
}

impl Default for PoolManager {
    fn default() -> Self {
        Self::new(PoolConfig::default().capacity)
    }
}
