#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! # Respool Core
//!
//! Brokers exclusive, temporary access to a finite set of resources among
//! many concurrent requesters.
//!
//! Two allocation disciplines share one registry:
//!
//! - **Typed scan allocation**: a requester asks for a resource of a given
//!   type and any free instance of that type satisfies the request. Failure
//!   is immediate when none is free.
//! - **Bounded blocking allocation**: a requester draws from a FIFO pool of
//!   interchangeable resources and may wait up to a timeout for one to be
//!   returned.
//!
//! Both guarantee that a resource has at most one holder at any instant,
//! without a global lock serializing unrelated resources.
//!
//! ## Crate Structure
//!
//! - **id**: resource identifiers (opaque tokens and dense slot numbers)
//! - **resource**: resource snapshots and the per-resource lease state
//! - **allocator**: the typed scan allocator and the bounded blocking pool
//! - **sync**: tracked locks and atomic counters used by the allocators
//! - **manager**: the `PoolManager` facade callers interact with
//! - **config**: TOML pool configuration
//!
//! ```
//! use respool_core::PoolManager;
//!
//! let pool = PoolManager::new(0);
//! let gpu = pool.add_resource(Some("GPU"));
//!
//! let held = pool.request_typed("GPU", "team42").unwrap();
//! assert_eq!(held, gpu);
//! assert!(pool.request_typed("GPU", "team43").is_err());
//!
//! pool.release(&held, Some("team42")).unwrap();
//! assert_eq!(pool.request_typed("GPU", "team43").unwrap(), gpu);
//! ```

mod allocator;

/// Pool configuration loaded from TOML
pub mod config;

/// Error types for pool operations
pub mod error;

/// Resource identifiers
pub mod id;

/// The facade external callers use
pub mod manager;

mod registry;

/// Resource snapshots and lease state
pub mod resource;

/// Pool-wide counters
pub mod stats;

/// Synchronization primitives used by the allocators
pub mod sync;

pub use config::{ConfigError, PoolConfig, TypedSeed};
pub use error::{PoolError, Result};
pub use id::ResourceId;
pub use manager::PoolManager;
pub use resource::{Resource, ResourceStatus};
pub use stats::PoolStats;
