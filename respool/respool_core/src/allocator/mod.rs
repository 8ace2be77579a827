//! Allocation strategies.
//!
//! - [`typed`]: non-blocking scan over resources of a requested type
//! - [`bounded`]: FIFO pool of interchangeable resources with timed waits

pub(crate) mod bounded;
pub(crate) mod typed;

pub(crate) use bounded::BoundedPool;
pub(crate) use typed::TypedAllocator;
