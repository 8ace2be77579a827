//! Error types for pool operations.
//!
//! Every variant is an expected outcome of a requested operation and is
//! returned to the caller. None of them is fatal to the process; an internal
//! disagreement between the registry and the bounded queue is a defect and
//! panics instead of surfacing here.

use crate::id::ResourceId;
use std::time::Duration;
use thiserror::Error;

/// Result type for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors returned by the pool manager and its allocators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The typed scan found no free resource of the requested type
    #[error("no available resource of type '{kind}'")]
    NoResourceAvailable {
        /// The requested resource type
        kind: String,
    },

    /// No pooled resource became available before the deadline
    #[error("no resource available within {0:?}")]
    TimedOut(Duration),

    /// The identifier is not known to the registry
    #[error("resource not found: {0}")]
    NotFound(ResourceId),

    /// A typed resource was released while it was not allocated
    #[error("resource {0} is not allocated")]
    NotAllocated(ResourceId),

    /// A pooled resource was released while it was not checked out
    #[error("resource {0} not found or already released")]
    NotFoundOrAlreadyReleased(ResourceId),

    /// A release targeted a bounded pool whose queue is already full
    #[error("releasing resource {id} would exceed pool capacity {capacity}")]
    PoolCapacityViolation {
        /// The resource being released
        id: ResourceId,
        /// Capacity of the pool at the time of the release
        capacity: usize,
    },

    /// The releasing requester is not the current holder
    #[error("resource {id} is held by '{owner}', not '{requester}'")]
    OwnerMismatch {
        /// The resource being released
        id: ResourceId,
        /// The recorded holder
        owner: String,
        /// The requester that attempted the release
        requester: String,
    },

    /// A textual identifier could not be parsed
    #[error("invalid resource id: {0}")]
    InvalidId(String),
}

impl PoolError {
    /// Whether the caller may simply try again later.
    ///
    /// Exhaustion and timeouts are transient; everything else is a caller
    /// input or lifecycle error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NoResourceAvailable { .. } | Self::TimedOut(_))
    }
}
