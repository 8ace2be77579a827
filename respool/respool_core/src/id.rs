//! Resource identifiers.
//!
//! Typed resources are named by a random UUID token; pooled resources get a
//! small dense number drawn from a monotonic sequence. Both live in the same
//! registry, so the identifier itself tells the pool manager which allocator
//! a release belongs to.
//!
//! # Examples
//!
//! ```
//! use respool_core::ResourceId;
//! use std::str::FromStr;
//!
//! let slot = ResourceId::from_str("4").unwrap();
//! assert_eq!(slot, ResourceId::slot(4));
//! assert!(!slot.is_token());
//!
//! let token = ResourceId::token();
//! assert_eq!(ResourceId::from_str(&token.to_string()).unwrap(), token);
//! ```

use crate::error::PoolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a resource, stable for the resource's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    /// Globally unique opaque token, used for typed resources
    Token(Uuid),

    /// Dense number assigned at creation, used for pooled resources
    Slot(u64),
}

impl ResourceId {
    /// Create a new random token identifier.
    pub fn token() -> Self {
        Self::Token(Uuid::new_v4())
    }

    /// Create a slot identifier from its number.
    pub fn slot(number: u64) -> Self {
        Self::Slot(number)
    }

    /// Whether this identifier names a typed resource.
    pub fn is_token(&self) -> bool {
        matches!(self, Self::Token(_))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(uuid) => write!(f, "{}", uuid),
            Self::Slot(number) => write!(f, "{}", number),
        }
    }
}

impl FromStr for ResourceId {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(number) = s.parse::<u64>() {
            return Ok(Self::Slot(number));
        }

        Uuid::parse_str(s)
            .map(Self::Token)
            .map_err(|_| PoolError::InvalidId(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique() {
        let a = ResourceId::token();
        let b = ResourceId::token();
        assert_ne!(a, b);
        assert!(a.is_token());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = ResourceId::from_str("not-an-id").unwrap_err();
        assert_eq!(err, PoolError::InvalidId("not-an-id".to_string()));

        assert!(ResourceId::from_str("-1").is_err());
    }

    #[test]
    fn test_serde_untagged() {
        let slot = serde_json::to_string(&ResourceId::slot(12)).unwrap();
        assert_eq!(slot, "12");

        let uuid = "550e8400-e29b-41d4-a716-446655440000";
        let token: ResourceId = serde_json::from_str(&format!("\"{}\"", uuid)).unwrap();
        assert_eq!(token.to_string(), uuid);
    }
}
