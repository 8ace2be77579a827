//! Resource snapshots and the mutable lease state behind them.

use crate::id::ResourceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Owner recorded for requesters that do not identify themselves
pub const ANONYMOUS_REQUESTER: &str = "anonymous";

/// Map a blank requester id to [`ANONYMOUS_REQUESTER`] so an allocated
/// resource always has a non-empty owner.
pub(crate) fn requester_or_anonymous(requester: &str) -> &str {
    if requester.trim().is_empty() {
        ANONYMOUS_REQUESTER
    } else {
        requester
    }
}

/// Allocation status of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    /// Free to be acquired
    Available,

    /// Held by exactly one requester
    Allocated,
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Allocated => write!(f, "allocated"),
        }
    }
}

/// A point-in-time view of a resource.
///
/// Snapshots are detached copies; they do not change when the underlying
/// resource is acquired or released afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Identifier of the resource
    pub id: ResourceId,

    /// Type tag, present only for typed resources
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<String>,

    /// Allocation status
    pub status: ResourceStatus,

    /// Current holder, present only while allocated
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner: Option<String>,

    /// When the current holder acquired the resource
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub acquired_at: Option<DateTime<Utc>>,

    /// How many times the resource has been handed out
    pub lease_count: u64,
}

impl Resource {
    /// Whether the resource was free when the snapshot was taken.
    pub fn is_available(&self) -> bool {
        self.status == ResourceStatus::Available
    }
}

/// Mutable per-resource state, only ever changed inside a transition on the
/// owning resource.
///
/// `owner` is set exactly when `status` is `Allocated`.
#[derive(Debug, Clone)]
pub(crate) struct Lease {
    status: ResourceStatus,
    owner: Option<String>,
    acquired_at: Option<DateTime<Utc>>,
    lease_count: u64,
}

impl Lease {
    pub(crate) fn new() -> Self {
        Self {
            status: ResourceStatus::Available,
            owner: None,
            acquired_at: None,
            lease_count: 0,
        }
    }

    pub(crate) fn is_available(&self) -> bool {
        self.status == ResourceStatus::Available
    }

    pub(crate) fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Hand the resource to `owner`. The caller must have checked availability.
    pub(crate) fn grant(&mut self, owner: &str) {
        debug_assert!(self.is_available(), "granting an allocated resource");
        self.status = ResourceStatus::Allocated;
        self.owner = Some(requester_or_anonymous(owner).to_string());
        self.acquired_at = Some(Utc::now());
        self.lease_count += 1;
    }

    /// Return the resource to the free state, wiping everything the holder
    /// left behind so the next holder starts clean.
    pub(crate) fn clear(&mut self) {
        self.status = ResourceStatus::Available;
        self.owner = None;
        self.acquired_at = None;
    }

    pub(crate) fn snapshot(&self, id: ResourceId, kind: Option<&str>) -> Resource {
        Resource {
            id,
            kind: kind.map(str::to_string),
            status: self.status,
            owner: self.owner.clone(),
            acquired_at: self.acquired_at,
            lease_count: self.lease_count,
        }
    }
}
